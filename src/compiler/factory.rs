//! The factory template wrapped around a lowered component.

/// Wraps `body` in a function taking the namespace objects positionally and
/// returning `export_name`. The result is meant to be evaluated as a function
/// body, so its value is the factory itself.
pub fn wrap(body: &str, parameters: &[String], export_name: &str) -> String {
    format!(
        "return function({}) {{\n{}\nreturn {};\n}}\n",
        parameters.join(", "),
        body.trim(),
        export_name
    )
}
