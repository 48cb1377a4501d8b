//! End-to-end agent scenarios over a real workspace.
//!
//! The model is scripted; the file system and search tools are real, and the
//! verifier runs `sh -c` scripts in place of `lean` / `lake build`.

#![cfg(unix)]

use std::time::Duration;

use jiuzhao::agent::{Agent, AgentPhase, AgentSettings, LoopStop, VERIFIED_NOTICE};
use jiuzhao::core::types::Role;
use jiuzhao::io::config::AgentConfig;
use jiuzhao::test_support::{Event, RecordingObserver, ScriptedModel, TestWorkspace};
use jiuzhao::tools::ToolRegistry;
use jiuzhao::tools::lean::{LeanTool, VerifierCommand};

/// Default tools, with the verifier swapped for shell scripts.
fn registry(workspace: &TestWorkspace, check: &str) -> ToolRegistry {
    let cfg = AgentConfig::default();
    let sh = |script: &str| VerifierCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        timeout: Duration::from_secs(5),
    };
    let mut registry = ToolRegistry::with_defaults(workspace.path(), &cfg);
    registry.register(
        LeanTool::new(workspace.path(), &cfg.verifier).with_commands(sh(check), sh("exit 0")),
    );
    registry
}

const WRITE_PROOF: &str = r#"I'll write the theorem first.
<TOOL name="file_system">
{"action": "write", "path": "A.lean", "content": "theorem theorem_a : 1 + 1 = 2 := by\n  rfl\n"}
</TOOL>"#;

const CHECK_PROOF: &str = r#"Now let me check it.
<TOOL name="lean_tool">
```json
{"command": "check_file", "path": "A.lean"}
```
</TOOL>"#;

/// Goal: prove `theorem_a`.
///
/// 1. Model writes `A.lean` (success-shaped result).
/// 2. Model checks it; the verifier exits 0 and the result carries `SUCCESS`.
/// 3. Model reports the verified proof without requesting a tool.
#[test]
fn write_check_and_complete() {
    let workspace = TestWorkspace::new().expect("workspace");
    let model = ScriptedModel::new([
        WRITE_PROOF,
        CHECK_PROOF,
        "The proof of `theorem_a` is verified. SUCCESS!",
    ]);
    let mut agent = Agent::new(
        model,
        registry(&workspace, "test -f \"$0\""),
        AgentSettings { max_turns: 10 },
    )
    .expect("agent");
    let mut observer = RecordingObserver::default();

    let outcome = agent.run("prove `theorem_a`", &mut observer);

    assert_eq!(outcome.stop, LoopStop::Completed);
    assert_eq!(outcome.model_requests, 3);
    assert!(outcome.verified);
    assert_eq!(agent.phase(), AgentPhase::AwaitingUser);
    assert_eq!(
        workspace.read("A.lean").expect("read"),
        "theorem theorem_a : 1 + 1 = 2 := by\n  rfl\n"
    );
    assert_eq!(
        observer.tool_results(),
        vec![
            "Successfully wrote to A.lean.",
            "SUCCESS: Proof Verified (No output from compiler).",
        ]
    );
    assert!(
        observer
            .events
            .contains(&Event::Success(VERIFIED_NOTICE.to_string()))
    );
    assert!(matches!(observer.events.last(), Some(Event::Completed(_))));

    let turns = agent.history().turns();
    assert_eq!(
        turns[5].content,
        "Tool 'lean_tool' output:\nSUCCESS: Proof Verified (No output from compiler)."
    );
}

/// Budget of 3, every reply requests a check that keeps failing.
#[test]
fn budget_exhaustion_stops_silently() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write("A.lean", "theorem theorem_a : 1 + 1 = 3 := by\n  rfl\n")
        .expect("write");
    let model = ScriptedModel::new([CHECK_PROOF; 5]);
    let mut agent = Agent::new(
        model,
        registry(&workspace, "echo \"$0:2:2: error: The rfl tactic failed\"; exit 1"),
        AgentSettings { max_turns: 3 },
    )
    .expect("agent");
    let mut observer = RecordingObserver::default();

    let outcome = agent.run("prove `theorem_a`", &mut observer);

    assert_eq!(outcome.stop, LoopStop::BudgetExhausted);
    assert_eq!(outcome.model_requests, 3);
    assert!(!outcome.verified);
    assert_eq!(agent.history().count_role(Role::Assistant), 3);
    assert_eq!(agent.history().count_role(Role::User), 4);
    assert!(
        observer
            .tool_results()
            .iter()
            .all(|text| text.starts_with("COMPILER ERROR:\nA.lean:2:2: error"))
    );
}

/// Replies without an envelope hand control back after a single request.
#[test]
fn conversational_reply_yields_after_one_request() {
    let workspace = TestWorkspace::new().expect("workspace");
    let model = ScriptedModel::new(["Which field should the statement live in?", "unused"]);
    let mut agent = Agent::new(
        model,
        registry(&workspace, "exit 0"),
        AgentSettings { max_turns: 3 },
    )
    .expect("agent");

    let outcome = agent.run("prove Fermat", &mut RecordingObserver::default());

    assert_eq!(outcome.stop, LoopStop::AwaitingUser);
    assert_eq!(outcome.model_requests, 1);
    assert_eq!(agent.history().len(), 3);
}

/// Unknown tools, traversal attempts and bad JSON all become transcript text.
#[test]
fn failures_are_reported_to_the_model() {
    let workspace = TestWorkspace::new().expect("workspace");
    workspace
        .write("Lib/Basic.lean", "theorem helper_lemma : True := trivial\n")
        .expect("write");
    let model = ScriptedModel::new([
        r#"<TOOL name="sledgehammer">{"goal": "x"}</TOOL>"#,
        r#"<TOOL name="file_system">{"action": "read", "path": "../secret"}</TOOL>"#,
        r#"<TOOL name="file_system">{"action": "read", "path": </TOOL>"#,
        r#"<TOOL name="project_search">{"query": "helper_lemma"}</TOOL>"#,
        "Found it.",
    ]);
    let mut agent = Agent::new(
        model,
        registry(&workspace, "exit 0"),
        AgentSettings { max_turns: 10 },
    )
    .expect("agent");
    let mut observer = RecordingObserver::default();

    let outcome = agent.run("find helper_lemma", &mut observer);

    assert_eq!(outcome.stop, LoopStop::AwaitingUser);
    assert_eq!(outcome.model_requests, 5);
    assert_eq!(
        observer.tool_results(),
        vec![
            "Error: Tool 'sledgehammer' not found.",
            "Error: Access denied. Please use relative paths within the project.",
            "Search Results:\nLib/Basic.lean:1: theorem helper_lemma : True := trivial",
        ]
    );
    let decode_turn = &agent.history().turns()[7];
    assert_eq!(decode_turn.role, Role::User);
    assert!(decode_turn.content.starts_with("Error: invalid JSON"));
}

/// The conversation carries over between `run` calls.
#[test]
fn follow_up_run_sees_previous_turns() {
    let workspace = TestWorkspace::new().expect("workspace");
    let model = ScriptedModel::new(["What should I prove?", "On it."]);
    let mut agent = Agent::new(
        model,
        registry(&workspace, "exit 0"),
        AgentSettings::default(),
    )
    .expect("agent");

    agent.run("hello", &mut RecordingObserver::default());
    agent.run("prove 1 + 1 = 2", &mut RecordingObserver::default());

    let roles: Vec<Role> = agent.history().turns().iter().map(|t| t.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::User,
            Role::Assistant,
            Role::User,
            Role::Assistant
        ]
    );
}
