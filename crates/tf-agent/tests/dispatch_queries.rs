//! Integration tests driving the dispatcher end to end against a
//! stand-in terraform binary in a scratch workspace.

#![cfg(unix)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use tf_agent::dispatch::{QueryDispatcher, UNRECOGNIZED};
use tf_ops::{Operation, TerraformHandler};

/// Scratch workspace plus a dispatcher wired to a fake binary.
struct TestAgent {
    // Held for its Drop — keeps the workspace alive for the test.
    _workspace: tempfile::TempDir,
    dispatcher: QueryDispatcher,
}

/// Echoes `terraform <args>` for every invocation.
const ECHO_SCRIPT: &str = "#!/bin/sh\necho \"terraform $@\"\n";

fn env_snapshot() -> HashMap<String, String> {
    std::env::vars().collect()
}

fn write_script(dir: &Path, body: &str) -> String {
    let path = dir.join("terraform");
    fs::write(&path, body).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_str().unwrap().to_string()
}

async fn agent_with_script(body: &str) -> TestAgent {
    let workspace = tempfile::tempdir().unwrap();
    fs::write(
        workspace.path().join("main.tf"),
        "resource \"null_resource\" \"example\" {}\n",
    )
    .unwrap();
    let binary = write_script(workspace.path(), body);
    let handler = TerraformHandler::with_binary(&binary, workspace.path(), env_snapshot())
        .await
        .unwrap();
    TestAgent {
        _workspace: workspace,
        dispatcher: QueryDispatcher::new(handler),
    }
}

#[tokio::test]
async fn plan_query_uses_plan_argument_template() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("what will change if I apply").await;
    assert_eq!(response.operation, Some(Operation::Plan));
    assert!(
        response.text.contains("plan -out=tfplan"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn tear_down_query_destroys_with_auto_approval() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("tear down my resources").await;
    assert_eq!(response.operation, Some(Operation::Destroy));
    assert!(
        response.text.contains("destroy -auto-approve"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn deploy_query_applies_with_auto_approval() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("deploy the infrastructure").await;
    assert_eq!(response.operation, Some(Operation::Apply));
    assert!(response.text.contains("apply -auto-approve"));
}

#[tokio::test]
async fn bare_tool_name_is_unrecognized() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("terraform").await;
    assert_eq!(response.operation, None);
    assert_eq!(response.text, UNRECOGNIZED);
}

#[tokio::test]
async fn unmatched_query_passes_through_verbatim() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("terraform fmt -check").await;
    assert_eq!(response.operation, None);
    assert!(
        response.text.contains("fmt -check"),
        "got: {}",
        response.text
    );
    assert!(response.text.starts_with("Command output:"));
}

#[tokio::test]
async fn outputs_listing_parses_machine_readable_form() {
    let script = "#!/bin/sh\n\
        if [ \"$1\" = \"output\" ]; then\n\
        echo '{\"endpoint\": {\"value\": \"https://example.com\", \"type\": \"string\"}}'\n\
        else\n\
        echo \"terraform $@\"\n\
        fi\n";
    let agent = agent_with_script(script).await;
    let response = agent.dispatcher.dispatch("list outputs").await;
    assert_eq!(response.operation, Some(Operation::ListOutputs));
    assert!(
        response.text.contains("endpoint = https://example.com"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn outputs_listing_falls_back_on_malformed_json() {
    let script = "#!/bin/sh\n\
        if [ \"$1\" = \"output\" ]; then\n\
        echo 'not json at all'\n\
        else\n\
        echo \"terraform $@\"\n\
        fi\n";
    let agent = agent_with_script(script).await;
    let response = agent.dispatcher.dispatch("list outputs").await;
    assert!(response.text.contains("Error parsing Terraform outputs"));
    assert!(response.text.contains("not json at all"));
}

#[tokio::test]
async fn modules_listing_groups_state_addresses() {
    let script = "#!/bin/sh\n\
        if [ \"$1\" = \"state\" ]; then\n\
        printf 'module.vpc.aws_vpc.main\\nmodule.dns.aws_route53_zone.primary\\naws_instance.web\\n'\n\
        else\n\
        echo \"terraform $@\"\n\
        fi\n";
    let agent = agent_with_script(script).await;
    let response = agent.dispatcher.dispatch("list modules").await;
    assert_eq!(response.operation, Some(Operation::ListModules));
    assert!(response.text.contains("- dns"));
    assert!(response.text.contains("- vpc"));
    assert!(!response.text.contains("web"));
}

#[tokio::test]
async fn drift_exit_code_two_reports_drift() {
    let script = "#!/bin/sh\n\
        if [ \"$2\" = \"-detailed-exitcode\" ]; then\n\
        echo 'aws_instance.web will be updated'\n\
        exit 2\n\
        fi\n\
        echo \"terraform $@\"\n";
    let agent = agent_with_script(script).await;
    let response = agent.dispatcher.dispatch("check for drift").await;
    assert_eq!(response.operation, Some(Operation::DriftCheck));
    assert!(response.text.starts_with("Drift detected!"));
    assert!(response.text.contains("aws_instance.web"));
}

#[tokio::test]
async fn status_query_reports_workspace() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let response = agent.dispatcher.dispatch("status").await;
    assert_eq!(response.operation, Some(Operation::Status));
    assert!(response.text.starts_with("Workspace: "));
}

#[tokio::test]
async fn help_query_needs_no_subprocess() {
    let agent = agent_with_script("#!/bin/sh\nexit 1\n").await;
    let response = agent.dispatcher.dispatch("help").await;
    assert_eq!(response.operation, Some(Operation::Help));
    assert!(response.text.contains("Terraform Assistant"));
}

#[tokio::test]
async fn failed_command_text_carries_stderr() {
    let script = "#!/bin/sh\necho 'backend initialization required' >&2\nexit 1\n";
    let agent = agent_with_script(script).await;
    let response = agent.dispatcher.dispatch("apply the configuration").await;
    assert!(
        response.text.contains("backend initialization required"),
        "got: {}",
        response.text
    );
}

#[tokio::test]
async fn responses_carry_audit_metadata() {
    let agent = agent_with_script(ECHO_SCRIPT).await;
    let a = agent.dispatcher.dispatch("show the current state").await;
    let b = agent.dispatcher.dispatch("show the current state").await;
    assert_ne!(a.id, b.id);
    assert_eq!(a.operation, Some(Operation::StateList));
    assert!(a.responded_at <= b.responded_at);
}
