//! Capability namespaces that compiled components may import from.
//! Read-only after construction; shared across compilations behind `Arc`.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Duplicate namespace identifier: {0}")]
    DuplicateId(String),
    #[error("Namespace identifier is not a valid binding name: {0:?}")]
    InvalidId(String),
}

/// How an import specifier is matched against a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Exact(String),
    Prefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Binding name inside the factory, e.g. `lucide`.
    pub id: String,
    pub resolution: Resolution,
    #[serde(default)]
    pub description: String,
    /// Names advertised to the model; not enforced at compile time.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl Namespace {
    pub fn exact(id: &str, specifier: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            resolution: Resolution::Exact(specifier.to_string()),
            description: description.to_string(),
            capabilities: Vec::new(),
        }
    }

    pub fn prefix(id: &str, prefix: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            resolution: Resolution::Prefix(prefix.to_string()),
            description: description.to_string(),
            capabilities: Vec::new(),
        }
    }

    pub fn with_capabilities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = names.into_iter().map(Into::into).collect();
        self
    }

    /// The specifier shown to model authors.
    pub fn specifier(&self) -> &str {
        match &self.resolution {
            Resolution::Exact(specifier) | Resolution::Prefix(specifier) => specifier,
        }
    }
}

/// Where a specifier ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved<'a> {
    Namespace(&'a Namespace),
    /// No entry matched; the specifier itself is used as the identifier.
    Literal(&'a str),
}

impl Resolved<'_> {
    pub fn binding(&self) -> &str {
        match self {
            Resolved::Namespace(namespace) => &namespace.id,
            Resolved::Literal(specifier) => specifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    namespaces: Vec<Namespace>,
}

impl NamespaceRegistry {
    /// Builds a registry; order is the factory parameter order.
    pub fn new(namespaces: Vec<Namespace>) -> Result<Self, RegistryError> {
        for (i, namespace) in namespaces.iter().enumerate() {
            if !is_identifier(&namespace.id) {
                return Err(RegistryError::InvalidId(namespace.id.clone()));
            }
            if namespaces[..i].iter().any(|other| other.id == namespace.id) {
                return Err(RegistryError::DuplicateId(namespace.id.clone()));
            }
        }
        Ok(Self { namespaces })
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// Factory parameter names, in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|namespace| namespace.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&Namespace> {
        self.namespaces.iter().find(|namespace| namespace.id == id)
    }

    /// Exact matches win over prefix matches; anything unmatched resolves to
    /// the literal specifier.
    pub fn resolve<'a>(&'a self, specifier: &'a str) -> Resolved<'a> {
        let exact = self.namespaces.iter().find(|namespace| {
            matches!(&namespace.resolution, Resolution::Exact(s) if s == specifier)
        });
        let prefixed = || {
            self.namespaces.iter().find(|namespace| {
                matches!(&namespace.resolution, Resolution::Prefix(p) if specifier.starts_with(p.as_str()))
            })
        };

        match exact.or_else(prefixed) {
            Some(namespace) => Resolved::Namespace(namespace),
            None => {
                warn!(specifier = specifier, "Import specifier is not a registered namespace");
                Resolved::Literal(specifier)
            }
        }
    }
}

impl Default for NamespaceRegistry {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
        }
    }
}

/// Shared default registry.
pub fn default_registry() -> Arc<NamespaceRegistry> {
    static DEFAULT: OnceLock<Arc<NamespaceRegistry>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(NamespaceRegistry::default())))
}

fn default_namespaces() -> Vec<Namespace> {
    vec![
        Namespace::exact("React", "react", "Base React; hooks such as useState and useEffect")
            .with_capabilities(["useState", "useEffect", "useMemo", "useCallback", "useRef", "useReducer"]),
        Namespace::exact("recharts", "recharts", "Charting primitives")
            .with_capabilities(["LineChart", "BarChart", "PieChart", "XAxis", "YAxis", "Tooltip", "Legend"]),
        Namespace::prefix("uiComponents", "@/components/ui", "Prebuilt shadcn/ui component library")
            .with_capabilities(["Button", "Card", "CardContent", "CardHeader", "Tabs", "Alert"]),
        Namespace::exact("lucide", "lucide-react", "Icon set"),
        Namespace::exact("framerMotion", "framer-motion", "Animation helpers")
            .with_capabilities(["motion", "AnimatePresence"]),
    ]
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
