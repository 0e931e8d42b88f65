use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("slife").expect("binary");
        cmd.current_dir(self.dir.path());
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }
}

/// init + two users + one catalog task with a reward skill.
fn setup(env: &TestEnv) {
    env.run_ok(&["init"]);
    env.run_ok(&["catalog", "add-skill", "Endurance"]);
    env.run_ok(&["catalog", "add-category", "Sport", "sport"]);
    env.run_ok(&[
        "catalog",
        "add-task",
        "Run 5km",
        "run-5km",
        "--description",
        "Run five kilometers outdoors",
        "--short",
        "Run 5km",
        "--difficulty",
        "medium",
        "--category",
        "sport",
        "--reward",
        "Endurance:50",
        "--bonus",
        "Endurance:20:under 25 minutes",
    ]);
    env.run_ok(&["user", "add", "alice"]);
    env.run_ok(&["user", "add", "bob"]);
}

fn error_code(v: &Value) -> &str {
    v["error"]["code"].as_str().unwrap()
}

fn start_task(env: &TestEnv, by: &str, target: Option<&str>) -> Value {
    let mut args = vec!["task", "start", "run-5km", "--by", by];
    if let Some(t) = target {
        args.extend(["--target", t]);
    }
    let v = env.run_ok(&args);
    v["data"]["instance"].clone()
}

fn subscribed_names(env: &TestEnv, user: &str) -> Vec<String> {
    let v = env.run_ok(&["user", "subscriptions", user]);
    v["data"]["subscriptions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap().to_string())
        .collect()
}

// ─── lifecycle ─────────────────────────────────────────────────────

#[test]
fn targeted_task_end_to_end() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let id = instance["id"].as_str().unwrap();
    assert_eq!(instance["status"], "started");

    let v = env.run_ok(&["task", "complete", id, "--by", "alice"]);
    assert_eq!(v["data"]["instance"]["status"], "completed");

    let v = env.run_ok(&["task", "confirm", id, "--by", "bob", "--rating", "5"]);
    let confirmed = &v["data"]["instance"];
    assert_eq!(confirmed["status"], "confirmed");
    assert_eq!(confirmed["rating"], 5);
    assert!(confirmed["confirmed_at"].is_string());

    assert_eq!(subscribed_names(&env, "alice"), vec!["bob"]);
    assert_eq!(subscribed_names(&env, "bob"), vec!["alice"]);
}

#[test]
fn duplicate_start_is_rejected() {
    let env = TestEnv::new();
    setup(&env);

    start_task(&env, "alice", None);
    let v = env.run_err(&["task", "start", "run-5km", "--by", "alice"]);
    assert_eq!(error_code(&v), "DUPLICATE_ACTIVE_TASK");
}

#[test]
fn cancel_frees_the_task_for_a_restart() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", None);
    let id = instance["id"].as_str().unwrap();
    let v = env.run_ok(&["task", "cancel", id, "--by", "alice"]);
    assert_eq!(v["data"]["instance"]["status"], "canceled");

    start_task(&env, "alice", None);
}

#[test]
fn confirm_requires_completed_status() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let id = instance["id"].as_str().unwrap();
    let v = env.run_err(&["task", "confirm", id, "--by", "bob"]);
    assert_eq!(error_code(&v), "INVALID_STATE_TRANSITION");
}

#[test]
fn initiator_cannot_confirm_own_task() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let id = instance["id"].as_str().unwrap();
    env.run_ok(&["task", "complete", id, "--by", "alice"]);
    let v = env.run_err(&["task", "confirm", id, "--by", "alice"]);
    assert_eq!(error_code(&v), "FORBIDDEN");
}

#[test]
fn confirmed_task_cannot_be_canceled() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let id = instance["id"].as_str().unwrap();
    env.run_ok(&["task", "complete", id, "--by", "alice"]);
    env.run_ok(&["task", "confirm", id, "--by", "bob"]);

    let v = env.run_err(&["task", "cancel", id, "--by", "alice"]);
    assert_eq!(error_code(&v), "ALREADY_CONFIRMED");
}

#[test]
fn rating_bounds_are_enforced() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let id = instance["id"].as_str().unwrap();
    env.run_ok(&["task", "complete", id, "--by", "alice"]);

    for bad in ["0", "6", "great"] {
        let v = env.run_err(&["task", "confirm", id, "--by", "bob", "--rating", bad]);
        assert_eq!(error_code(&v), "INVALID_RATING");
        let v = env.run_ok(&["task", "show", id]);
        assert_eq!(v["data"]["instance"]["status"], "completed");
        assert!(v["data"]["instance"]["rating"].is_null());
    }
}

#[test]
fn self_targeting_is_rejected() {
    let env = TestEnv::new();
    setup(&env);
    let v = env.run_err(&["task", "start", "run-5km", "--by", "alice", "--target", "alice"]);
    assert_eq!(error_code(&v), "INVALID_TARGET");
}

#[test]
fn unknown_target_is_rejected() {
    let env = TestEnv::new();
    setup(&env);
    let v = env.run_err(&["task", "start", "run-5km", "--by", "alice", "--target", "nobody"]);
    assert_eq!(error_code(&v), "TARGET_NOT_FOUND");
}

// ─── invitation + anonymous merge ──────────────────────────────────

#[test]
fn anonymous_invitation_and_merge_on_registration() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", None);
    let id = instance["id"].as_str().unwrap();
    let token = instance["invitation_token"].as_str().unwrap();
    env.run_ok(&["task", "complete", id, "--by", "alice"]);

    let v = env.run_ok(&["invite", "accept", token, "--session", "anon123"]);
    assert_eq!(
        v["data"]["instance"]["invitation_token"],
        format!("anon123_{token}")
    );

    let v = env.run_ok(&["invite", "confirm", token, "--session", "anon123", "--rating", "4"]);
    assert_eq!(v["data"]["instance"]["status"], "confirmed");
    assert!(v["data"]["instance"]["target_user_id"].is_null());

    let v = env.run_ok(&["user", "add", "dave", "--session", "anon123"]);
    let merged = v["data"]["merged_tasks"].as_array().unwrap();
    assert_eq!(merged.len(), 1);
    let dave_id = v["data"]["user"]["id"].as_str().unwrap();
    assert_eq!(merged[0]["target_user_id"], dave_id);

    assert_eq!(subscribed_names(&env, "alice"), vec!["dave"]);
    assert_eq!(subscribed_names(&env, "dave"), vec!["alice"]);
}

#[test]
fn named_target_gives_way_to_confirming_account() {
    let env = TestEnv::new();
    setup(&env);

    let v = env.run_ok(&[
        "task", "start", "run-5km", "--by", "alice", "--target-name", "John",
    ]);
    let instance = &v["data"]["instance"];
    let id = instance["id"].as_str().unwrap();
    let token = instance["invitation_token"].as_str().unwrap();
    assert_eq!(instance["target_user_name"], "John");

    env.run_ok(&["task", "complete", id, "--by", "alice"]);
    let v = env.run_ok(&["task", "confirm", id, "--by", "bob", "--token", token]);
    let confirmed = &v["data"]["instance"];
    assert!(confirmed["target_user_id"].is_string());
    assert!(confirmed["target_user_name"].is_null());
}

#[test]
fn invitation_for_targeted_task_is_refused() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", Some("bob"));
    let token = instance["invitation_token"].as_str().unwrap();
    let v = env.run_err(&["invite", "accept", token, "--session", "anon123"]);
    assert_eq!(error_code(&v), "TARGET_ALREADY_BOUND");
}

#[test]
fn registered_user_confirms_open_task_with_token() {
    let env = TestEnv::new();
    setup(&env);

    let instance = start_task(&env, "alice", None);
    let id = instance["id"].as_str().unwrap();
    let token = instance["invitation_token"].as_str().unwrap();
    env.run_ok(&["task", "complete", id, "--by", "alice"]);

    // without the token the open task cannot be confirmed
    let v = env.run_err(&["task", "confirm", id, "--by", "bob"]);
    assert_eq!(error_code(&v), "FORBIDDEN");

    let v = env.run_ok(&["task", "confirm", id, "--by", "bob", "--token", token]);
    let bob_id = v["data"]["instance"]["target_user_id"].as_str().unwrap();
    assert!(!bob_id.is_empty());
    assert_eq!(subscribed_names(&env, "bob"), vec!["alice"]);
}

#[test]
fn unknown_invitation_token() {
    let env = TestEnv::new();
    setup(&env);
    let v = env.run_err(&["invite", "accept", "no-such-token"]);
    assert_eq!(error_code(&v), "NOT_FOUND");
}

// ─── subscriptions ─────────────────────────────────────────────────

#[test]
fn subscribe_unsubscribe_round_trip() {
    let env = TestEnv::new();
    setup(&env);

    env.run_ok(&["user", "subscribe", "alice", "bob"]);
    assert_eq!(subscribed_names(&env, "alice"), vec!["bob"]);

    let v = env.run_err(&["user", "subscribe", "alice", "bob"]);
    assert_eq!(error_code(&v), "ALREADY_SUBSCRIBED");

    env.run_ok(&["user", "unsubscribe", "alice", "bob"]);
    assert!(subscribed_names(&env, "alice").is_empty());

    let v = env.run_err(&["user", "unsubscribe", "alice", "bob"]);
    assert_eq!(error_code(&v), "NOT_FOUND");
}

#[test]
fn self_subscription_is_rejected() {
    let env = TestEnv::new();
    setup(&env);
    let v = env.run_err(&["user", "subscribe", "alice", "alice"]);
    assert_eq!(error_code(&v), "SELF_SUBSCRIPTION");
}

// ─── engagement counter ────────────────────────────────────────────

#[test]
fn likes_counter_tracks_like_records() {
    let env = TestEnv::new();
    setup(&env);
    env.run_ok(&["user", "add", "carol"]);

    let v = env.run_ok(&["post", "create", "--author", "alice", "hello world"]);
    let post_id = v["data"]["post"]["id"].as_str().unwrap().to_string();

    let v = env.run_ok(&["post", "like", &post_id, "--by", "bob"]);
    assert_eq!(v["data"]["likes_count"], 1);
    let v = env.run_ok(&["post", "like", &post_id, "--by", "carol"]);
    assert_eq!(v["data"]["likes_count"], 2);

    let v = env.run_err(&["post", "like", &post_id, "--by", "bob"]);
    assert_eq!(error_code(&v), "ALREADY_LIKED");

    let v = env.run_ok(&["post", "unlike", &post_id, "--by", "bob"]);
    assert_eq!(v["data"]["likes_count"], 1);

    let v = env.run_err(&["post", "unlike", &post_id, "--by", "bob"]);
    assert_eq!(error_code(&v), "NOT_FOUND");

    let v = env.run_ok(&["post", "show", &post_id]);
    assert_eq!(v["data"]["post"]["likes_count"], 1);
}

#[test]
fn comment_likes_are_counted_separately() {
    let env = TestEnv::new();
    setup(&env);

    let v = env.run_ok(&["post", "create", "--author", "alice", "hello"]);
    let post_id = v["data"]["post"]["id"].as_str().unwrap().to_string();
    let v = env.run_ok(&["post", "comment", &post_id, "--author", "bob", "nice"]);
    let comment_id = v["data"]["comment"]["id"].as_str().unwrap().to_string();

    // comments resolve by ID prefix like every other entity
    let v = env.run_ok(&["post", "like-comment", &comment_id[..10], "--by", "alice"]);
    assert_eq!(v["data"]["likes_count"], 1);

    let v = env.run_ok(&["post", "show", &post_id]);
    assert_eq!(v["data"]["post"]["likes_count"], 0);
    assert_eq!(v["data"]["comments"][0]["likes_count"], 1);
}

// ─── catalog ───────────────────────────────────────────────────────

#[test]
fn catalog_show_splits_rewards() {
    let env = TestEnv::new();
    setup(&env);

    let v = env.run_ok(&["catalog", "show", "run-5km"]);
    let task = &v["data"]["task"];
    assert_eq!(task["difficulty"], "medium");
    assert_eq!(task["rewards"].as_array().unwrap().len(), 1);
    assert_eq!(task["additional_rewards"].as_array().unwrap().len(), 1);
    assert_eq!(task["additional_rewards"][0]["description"], "under 25 minutes");
}

#[test]
fn catalog_list_hides_active_tasks() {
    let env = TestEnv::new();
    setup(&env);

    let v = env.run_ok(&["catalog", "list", "--available-to", "alice"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 1);

    start_task(&env, "alice", None);
    let v = env.run_ok(&["catalog", "list", "--available-to", "alice"]);
    assert!(v["data"]["tasks"].as_array().unwrap().is_empty());

    // other users still see it
    let v = env.run_ok(&["catalog", "list", "--available-to", "bob"]);
    assert_eq!(v["data"]["tasks"].as_array().unwrap().len(), 1);
}

#[test]
fn registration_grants_catalog_skills() {
    let env = TestEnv::new();
    setup(&env);

    let v = env.run_ok(&["user", "show", "alice"]);
    let skills = v["data"]["skills"].as_array().unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0]["skill"], "Endurance");
    assert_eq!(skills[0]["level"], 1);
}

// ─── devices & misc ────────────────────────────────────────────────

#[test]
fn device_token_registration_is_exclusive() {
    let env = TestEnv::new();
    setup(&env);

    env.run_ok(&["device", "register", "tok-1", "--user", "alice"]);
    // same token moves to bob
    let v = env.run_ok(&["device", "register", "tok-1", "--user", "bob", "--platform", "ios"]);
    assert_eq!(v["data"]["device"]["platform"], "ios");

    env.run_ok(&["device", "unregister", "tok-1"]);
    let v = env.run_err(&["device", "unregister", "tok-1"]);
    assert_eq!(error_code(&v), "NOT_FOUND");
}

#[test]
fn commands_require_init() {
    let env = TestEnv::new();
    let v = env.run_err(&["user", "list"]);
    assert_eq!(error_code(&v), "NOT_INITIALIZED");
}

#[test]
fn text_output_prints_invitation_token() {
    let env = TestEnv::new();
    setup(&env);

    env.cmd()
        .args(["task", "start", "run-5km", "--by", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invitation token:"));
}
