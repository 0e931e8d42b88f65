use serde_json::json;

use crate::cli::commands::InviteCommands;
use crate::cli::parse_rating;
use crate::db::connection;
use crate::error::SlifeError;
use crate::output;
use crate::service::lifecycle;

pub fn run(cmd: InviteCommands, json_output: bool) -> i32 {
    let result = match cmd {
        InviteCommands::Accept { token, session } => {
            run_accept(&token, session.as_deref(), json_output)
        }
        InviteCommands::Confirm {
            token,
            session,
            rating,
        } => run_confirm(&token, &session, rating.as_deref(), json_output),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            if json_output {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&output::json::error(&e)).unwrap()
                );
            } else {
                eprintln!("Error: {}", e.message);
            }
            1
        }
    }
}

fn run_accept(token: &str, session: Option<&str>, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let (instance, session_id) = lifecycle::accept_invitation(&conn, token, session)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "instance": output::json::instance_json(&instance),
                "session": session_id
            })))
            .unwrap()
        );
    } else {
        println!("Invitation claimed by session {session_id}");
        println!("Keep this session id to confirm and to merge on registration.");
    }
    Ok(0)
}

fn run_confirm(
    token: &str,
    session: &str,
    rating: Option<&str>,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let rating = parse_rating(rating)?;
    let instance = lifecycle::confirm_anonymous(&conn, session, token, rating)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "instance": output::json::instance_json(&instance)
            })))
            .unwrap()
        );
    } else {
        println!("Task {} -> {}", instance.id, instance.status.as_str());
        println!("Register with --session {session} to claim it on your account.");
    }
    Ok(0)
}
