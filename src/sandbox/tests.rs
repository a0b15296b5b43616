use super::*;
use crate::compiler::compile;
use crate::registry::NamespaceRegistry;
use async_trait::async_trait;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

const WAIT: Duration = Duration::from_secs(5);

/// Renders `<div>{code}|{namespaces}</div>`. Codes starting with `slow` hang,
/// codes starting with `throw` fail.
#[derive(Default)]
struct Scripted {
    calls: Mutex<Vec<String>>,
}

impl Scripted {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn evaluate(&self, code: &str, namespaces: &[String]) -> Result<Rendered, EvaluationError> {
        self.calls.lock().unwrap().push(code.to_string());
        if code.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        if code.starts_with("throw") {
            return Err(EvaluationError::Script("boom".into()));
        }
        Ok(Rendered::new(format!("<div>{}|{}</div>", code, namespaces.join(",")), code))
    }
}

async fn wait_calls(evaluator: &Scripted, n: usize) {
    tokio::time::timeout(WAIT, async {
        while evaluator.calls().len() < n {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("evaluator was not called in time");
}

async fn wait_markup(surface: &mut Surface, markup: &str) {
    tokio::time::timeout(WAIT, surface.wait_for(|r| r.as_ref().is_some_and(|r| r.markup == markup)))
        .await
        .expect("surface did not render in time")
        .expect("surface closed");
}

fn mount_context(evaluator: Arc<Scripted>) -> (Port, IsolatedContext, Surface) {
    let (host, context_port) = channel();
    let (tx, surface) = watch::channel(None);
    let context = IsolatedContext::mount(context_port, evaluator, vec!["ns".into()], Arc::new(tx));
    (host, context, surface)
}

fn update(code: &str) -> Signal {
    Signal::Update { code: code.into() }
}

// === Protocol ===

#[test]
fn signals_use_the_tagged_wire_shape() {
    assert_eq!(Signal::Ready.encode().unwrap(), r#"{"signal":"ready"}"#);
    assert_eq!(update("x()").encode().unwrap(), r#"{"signal":"update","code":"x()"}"#);
    assert_eq!(Signal::decode(r#"{"code":"a","signal":"update"}"#).unwrap(), update("a"));
}

#[test]
fn malformed_messages_do_not_decode() {
    for raw in ["", "ready", r#"{"signal":"reload"}"#, r#"{"signal":"update"}"#] {
        assert!(matches!(Signal::decode(raw), Err(ProtocolError::Decode { .. })), "{}", raw);
    }
}

// === Channel ===

#[tokio::test]
async fn ports_skip_malformed_messages() {
    let (a, mut b) = channel();
    a.post_raw("not json".into());
    a.post(&Signal::Ready);
    assert_eq!(b.recv().await, Some(Signal::Ready));
}

#[tokio::test]
async fn posting_to_a_closed_peer_is_silent() {
    let (a, b) = channel();
    drop(b);
    a.post(&update("lost"));
}

#[test]
fn drain_returns_everything_queued() {
    let (a, mut b) = channel();
    a.post(&update("1"));
    a.post_raw("{".into());
    a.post(&update("2"));
    assert_eq!(b.drain(), vec![update("1"), update("2")]);
    assert!(b.drain().is_empty());
}

// === Host state machine ===

#[test]
fn source_submitted_before_ready_is_held() {
    let (port, mut context) = channel();
    let mut host = SandboxHost::new(port);

    host.submit("a".into());
    assert_eq!(host.state(), HostState::Uninitialized);
    assert!(context.drain().is_empty());

    host.handle(Signal::Ready);
    assert_eq!(host.state(), HostState::Rendering);
    assert_eq!(context.drain(), vec![update("a")]);
}

#[test]
fn ready_without_source_waits_for_submit() {
    let (port, mut context) = channel();
    let mut host = SandboxHost::new(port);

    host.handle(Signal::Ready);
    assert_eq!(host.state(), HostState::Ready);
    assert!(context.drain().is_empty());

    host.submit("a".into());
    host.submit("b".into());
    assert_eq!(host.state(), HostState::Rendering);
    assert_eq!(context.drain(), vec![update("a"), update("b")]);
    assert_eq!(host.last_source(), Some("b"));
}

#[test]
fn remount_resends_last_source_after_next_ready() {
    let (port, mut old) = channel();
    let mut host = SandboxHost::new(port);
    host.handle(Signal::Ready);
    host.submit("a".into());
    assert_eq!(old.drain(), vec![update("a")]);

    let (port, mut fresh) = channel();
    host.remount(port);
    assert_eq!(host.state(), HostState::Uninitialized);
    assert!(fresh.drain().is_empty());

    host.handle(Signal::Ready);
    assert_eq!(fresh.drain(), vec![update("a")]);
    assert!(old.drain().is_empty());
}

#[test]
fn host_ignores_updates_from_the_context() {
    let (port, mut context) = channel();
    let mut host = SandboxHost::new(port);
    host.handle(update("evil"));
    assert_eq!(host.state(), HostState::Uninitialized);
    assert_eq!(host.last_source(), None);
    assert!(context.drain().is_empty());
}

// === Isolated context ===

#[tokio::test]
async fn context_announces_itself_then_renders_updates() {
    let evaluator = Arc::new(Scripted::default());
    let (mut host, _context, mut surface) = mount_context(evaluator.clone());

    assert_eq!(host.recv().await, Some(Signal::Ready));
    assert_eq!(*surface.borrow(), None);

    host.post(&update("a"));
    wait_markup(&mut surface, "<div>a|ns</div>").await;
    host.post(&update("b"));
    wait_markup(&mut surface, "<div>b|ns</div>").await;
    assert_eq!(evaluator.calls(), ["a", "b"]);
}

#[tokio::test]
async fn burst_of_updates_is_coalesced() {
    let evaluator = Arc::new(Scripted::default());
    let (host, _context, mut surface) = mount_context(evaluator.clone());

    host.post(&update("a"));
    host.post(&update("b"));
    host.post(&update("c"));
    wait_markup(&mut surface, "<div>c|ns</div>").await;
    assert_eq!(evaluator.calls(), ["c"]);
}

#[tokio::test]
async fn new_update_supersedes_in_flight_evaluation() {
    let evaluator = Arc::new(Scripted::default());
    let (host, _context, mut surface) = mount_context(evaluator.clone());

    host.post(&update("slow"));
    wait_calls(&evaluator, 1).await;
    host.post(&update("fast"));

    wait_markup(&mut surface, "<div>fast|ns</div>").await;
    assert_eq!(evaluator.calls(), ["slow", "fast"]);
}

#[tokio::test]
async fn failed_evaluation_keeps_previous_render() {
    let evaluator = Arc::new(Scripted::default());
    let (host, _context, mut surface) = mount_context(evaluator.clone());

    host.post(&update("ok"));
    wait_markup(&mut surface, "<div>ok|ns</div>").await;

    host.post(&update("throw"));
    wait_calls(&evaluator, 2).await;
    tokio::task::yield_now().await;

    assert!(!surface.has_changed().unwrap());
    assert_eq!(surface.borrow().as_ref().map(|r| r.markup.as_str()), Some("<div>ok|ns</div>"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unmount_waits_for_the_context_to_stop() {
    let evaluator = Arc::new(Scripted::default());
    let (mut host, context_port) = channel();
    let (tx, surface) = watch::channel(None);
    let tx = Arc::new(tx);
    let context = IsolatedContext::mount(context_port, evaluator.clone(), vec![], Arc::clone(&tx));

    assert_eq!(host.recv().await, Some(Signal::Ready));
    host.post(&update("slow"));
    wait_calls(&evaluator, 1).await;

    context.unmount().await;
    assert_eq!(Arc::strong_count(&tx), 1);
    assert_eq!(host.recv().await, None);
    assert_eq!(*surface.borrow(), None);
}

// === Session ===

#[tokio::test]
async fn session_renders_compiled_factory_with_registry_namespaces() {
    let evaluator = Arc::new(Scripted::default());
    let registry = NamespaceRegistry::default();
    let session = SandboxSession::mount(evaluator.clone(), &registry);
    let factory = compile("export default function App() {}").unwrap();

    session.load_and_render(&factory);
    let expected = format!("<div>{}|React,recharts,uiComponents,lucide,framerMotion</div>", factory.code);
    wait_markup(&mut session.surface(), &expected).await;

    let rendered = session.current().unwrap();
    assert_eq!(rendered.source_digest, factory.digest);
}

#[tokio::test]
async fn session_remount_rerenders_last_factory() {
    let evaluator = Arc::new(Scripted::default());
    let session = SandboxSession::mount(evaluator.clone(), &NamespaceRegistry::default());
    let factory = compile("const A = 1;\nexport default A;").unwrap();

    session.load_and_render(&factory);
    let mut surface = session.surface();
    tokio::time::timeout(WAIT, surface.wait_for(|r| r.is_some())).await.unwrap().unwrap();

    session.remount();
    wait_calls(&evaluator, 2).await;
    tokio::time::timeout(WAIT, surface.wait_for(|r| r.is_some())).await.unwrap().unwrap();

    assert_eq!(evaluator.calls(), [factory.code.clone(), factory.code.clone()]);
    assert_eq!(session.current().map(|r| r.source_digest), Some(factory.digest));
}

#[tokio::test]
async fn sessions_get_distinct_ids() {
    let registry = NamespaceRegistry::default();
    let a = SandboxSession::mount(Arc::new(Scripted::default()), &registry);
    let b = SandboxSession::mount(Arc::new(Scripted::default()), &registry);
    assert_ne!(a.id(), b.id());
}

// === Process evaluator ===

#[cfg(unix)]
mod process {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sh(script: &str) -> ProcessEvaluator {
        ProcessEvaluator::new("/bin/sh", vec!["-c".into(), script.into()])
    }

    #[tokio::test]
    async fn payload_arrives_as_json_on_stdin() {
        let rendered = sh("exec /bin/cat")
            .evaluate("return function(React) {}", &["React".into()])
            .await
            .unwrap();
        let payload: serde_json::Value = serde_json::from_str(&rendered.markup).unwrap();
        assert_eq!(payload["factory"], "return function(React) {}");
        assert_eq!(payload["namespaces"], serde_json::json!(["React"]));
    }

    #[tokio::test]
    async fn environment_is_cleared() {
        let rendered = sh("/bin/cat >/dev/null; printf '%s' \"${HOME:-none}\"")
            .evaluate("x", &[])
            .await
            .unwrap();
        assert_eq!(rendered.markup, "none");
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_script_error() {
        let result = sh("/bin/cat >/dev/null; echo boom >&2; exit 1").evaluate("x", &[]).await;
        match result {
            Err(EvaluationError::Script(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn timeout_is_enforced_when_configured() {
        let evaluator = sh("exec /bin/sleep 5").with_timeout(Duration::from_millis(50));
        let result = evaluator.evaluate("x", &[]).await;
        assert!(matches!(result, Err(EvaluationError::Timeout(_))));
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let evaluator = ProcessEvaluator::new("/nonexistent/evaluator", vec![]);
        let result = evaluator.evaluate("x", &[]).await;
        assert!(matches!(result, Err(EvaluationError::Spawn { .. })));
    }
}
