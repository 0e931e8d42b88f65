use serde_json::json;

use crate::cli::commands::TaskCommands;
use crate::cli::parse_rating;
use crate::db::{connection, task_repo, user_repo};
use crate::error::SlifeError;
use crate::output;
use crate::service::lifecycle;
use crate::service::notify::LogNotifier;

pub fn run(cmd: TaskCommands, json_output: bool) -> i32 {
    let result = match cmd {
        TaskCommands::Start {
            task,
            by,
            target,
            target_name,
        } => run_start(&task, &by, target.as_deref(), target_name.as_deref(), json_output),
        TaskCommands::Complete { id, by } => run_complete(&id, &by, json_output),
        TaskCommands::Confirm {
            id,
            by,
            token,
            rating,
        } => run_confirm(&id, &by, token.as_deref(), rating.as_deref(), json_output),
        TaskCommands::Cancel { id, by } => run_cancel(&id, &by, json_output),
        TaskCommands::List { by } => run_list(&by, json_output),
        TaskCommands::Show { id } => run_show(&id, json_output),
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

fn run_start(
    task: &str,
    by: &str,
    target: Option<&str>,
    target_name: Option<&str>,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let instance = lifecycle::start(&conn, task, by, target, target_name)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "instance": output::json::instance_json(&instance)
            })))
            .unwrap()
        );
    } else {
        println!("Started task instance {}", instance.id);
        if instance.target_user_id.is_none() {
            println!("Invitation token: {}", instance.invitation_token);
        }
    }
    Ok(0)
}

fn run_complete(id: &str, by: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let instance = lifecycle::complete(&conn, &LogNotifier, id, by)?;
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
        println!("Invitation token: {}", instance.invitation_token);
    }
    Ok(0)
}

fn run_confirm(
    id: &str,
    by: &str,
    token: Option<&str>,
    rating: Option<&str>,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let rating = parse_rating(rating)?;
    let instance = lifecycle::confirm(&conn, id, by, token, rating)?;
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
        println!("Mutual subscription created with the initiator");
    }
    Ok(0)
}

fn run_cancel(id: &str, by: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let instance = lifecycle::cancel(&conn, id, by)?;
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
    }
    Ok(0)
}

fn run_list(by: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let user = user_repo::resolve_user(&conn, by)?;
    let instances = task_repo::list_by_initiator(&conn, &user.id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "instances": instances.iter().map(output::json::instance_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_instance_list(&instances);
    }
    Ok(0)
}

fn run_show(id: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let instance = task_repo::resolve_instance(&conn, id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "instance": output::json::instance_json(&instance)
            })))
            .unwrap()
        );
    } else {
        output::text::print_instance(&instance);
    }
    Ok(0)
}
