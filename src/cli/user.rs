use serde_json::json;

use crate::cli::commands::UserCommands;
use crate::db::{connection, user_repo};
use crate::error::SlifeError;
use crate::output;
use crate::service::{registration, subscriptions};

pub fn run(cmd: UserCommands, json_output: bool) -> i32 {
    let result = match cmd {
        UserCommands::Add { username, session } => {
            run_add(&username, session.as_deref(), json_output)
        }
        UserCommands::List => run_list(json_output),
        UserCommands::Show { reference } => run_show(&reference, json_output),
        UserCommands::Subscribe { user, author } => run_subscribe(&user, &author, json_output),
        UserCommands::Unsubscribe { user, author } => run_unsubscribe(&user, &author, json_output),
        UserCommands::Subscriptions { user } => run_subscriptions(&user, json_output),
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

fn run_add(username: &str, session: Option<&str>, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let (user, merged) = registration::register_user(&conn, username, session)?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user),
                "merged_tasks": merged.iter().map(output::json::instance_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        println!("Registered user: {} ({})", user.username, user.id);
        if !merged.is_empty() {
            println!("Merged {} anonymously confirmed task(s)", merged.len());
        }
    }
    Ok(0)
}

fn run_list(json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let users = user_repo::list_users(&conn)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "users": users.iter().map(output::json::user_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_user_list(&users);
    }
    Ok(0)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let user = user_repo::resolve_user(&conn, reference)?;
    let skills = user_repo::list_user_skills(&conn, &user.id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "user": output::json::user_json(&user),
                "skills": skills.iter().map(output::json::user_skill_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_user(&user);
        output::text::print_user_skills(&skills);
    }
    Ok(0)
}

fn run_subscribe(user: &str, author: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let (edge, created) = subscriptions::subscribe(&conn, user, author)?;
    if !created {
        return Err(SlifeError::already_subscribed(author));
    }
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "subscription": {
                    "user_id": edge.user_id,
                    "subscribing_id": edge.subscribing_id
                }
            })))
            .unwrap()
        );
    } else {
        println!("{user} is now subscribed to {author}");
    }
    Ok(0)
}

fn run_unsubscribe(user: &str, author: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    subscriptions::unsubscribe(&conn, user, author)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "unsubscribed": { "user": user, "author": author }
            })))
            .unwrap()
        );
    } else {
        println!("{user} unsubscribed from {author}");
    }
    Ok(0)
}

fn run_subscriptions(user: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let authors = subscriptions::subscriptions(&conn, user)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "subscriptions": authors.iter().map(output::json::user_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_user_list(&authors);
    }
    Ok(0)
}
