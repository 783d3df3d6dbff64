//! External-process transformer protocol
#![cfg(unix)]

use pretty_assertions::assert_eq;
use tqe_artifact::ClassBytes;
use tqe_cli::CommandTransformerFactory;
use tqe_enhance::{
    AgentOptions, ClassBytesLoader, DiagnosticLog, MessageLog, PackageSet, Severity,
    TransformError, TransformScope, Transformer, TransformerFactory,
};
use tqe_test_utils::class_name;

struct NoClasses;

impl ClassBytesLoader for NoClasses {
    fn load_class_bytes(&self, _class_path: &str) -> Option<ClassBytes> {
        None
    }
}

/// Transformer running `script` under `sh -c`; the class name lands in `$1`
fn shell(script: &str, packages: &[&str]) -> Box<dyn Transformer> {
    let packages: PackageSet = packages.iter().collect();
    CommandTransformerFactory::new(["sh", "-c", script, "tqe-agent"])
        .create(&AgentOptions::default(), &packages)
        .unwrap()
}

fn run(
    transformer: &dyn Transformer,
    messages: &MessageLog,
    bytes: &[u8],
) -> Result<Option<Vec<u8>>, TransformError> {
    let log = DiagnosticLog::new(messages);
    let scope = TransformScope::new(&NoClasses, &log);
    transformer.transform(scope, &class_name("com.acme.domain.QOrder"), bytes)
}

#[test]
fn stdout_is_the_transformed_class() {
    let messages = MessageLog::new();
    let out = run(shell("cat; printf '+enhanced'", &[]).as_ref(), &messages, b"class").unwrap();
    assert_eq!(out, Some(b"class+enhanced".to_vec()));
}

#[test]
fn empty_stdout_declines() {
    let messages = MessageLog::new();
    let out = run(shell("cat > /dev/null", &[]).as_ref(), &messages, b"class").unwrap();
    assert_eq!(out, None);
}

#[test]
fn class_name_is_the_last_argument() {
    let messages = MessageLog::new();
    let out = run(shell("cat > /dev/null; printf '%s' \"$1\"", &[]).as_ref(), &messages, b"x").unwrap();
    assert_eq!(out, Some(b"com.acme.domain.QOrder".to_vec()));
}

#[test]
fn packages_and_agent_args_in_environment() {
    let messages = MessageLog::new();
    let transformer = shell(
        "cat > /dev/null; printf '%s|%s' \"$TQE_PACKAGES\" \"$TQE_AGENT\"",
        &["com.b", "com.a.*"],
    );
    let out = run(transformer.as_ref(), &messages, b"x").unwrap();
    assert_eq!(out, Some(b"com.a,com.b|debug=2".to_vec()));
}

#[test]
fn stderr_lines_become_information_messages() {
    let messages = MessageLog::new();
    let script = "cat > /dev/null; echo 'enhancing QOrder' >&2; echo 'query bean fields added' >&2";
    run(shell(script, &[]).as_ref(), &messages, b"x").unwrap();
    assert_eq!(
        messages.texts(Severity::Information),
        vec!["enhancing QOrder".to_string(), "query bean fields added".to_string()]
    );
}

#[test]
fn nonzero_exit_is_a_transform_error() {
    let messages = MessageLog::new();
    let err = run(shell("cat > /dev/null; exit 3", &[]).as_ref(), &messages, b"x").unwrap_err();
    assert!(matches!(err, TransformError::Agent { .. }));
    assert!(err.to_string().contains("exited with"));
}

#[test]
fn child_ignoring_stdin_is_not_an_error() {
    let messages = MessageLog::new();
    let big = vec![0_u8; 1 << 20];
    let out = run(shell("printf 'done'", &[]).as_ref(), &messages, &big).unwrap();
    assert_eq!(out, Some(b"done".to_vec()));
}

#[test]
fn missing_program_is_a_transform_error() {
    let transformer = CommandTransformerFactory::parse("/nonexistent/tqe-agent")
        .create(&AgentOptions::default(), &PackageSet::new())
        .unwrap();
    let messages = MessageLog::new();
    let err = run(transformer.as_ref(), &messages, b"x").unwrap_err();
    assert!(err.to_string().contains("cannot run /nonexistent/tqe-agent"));
}
