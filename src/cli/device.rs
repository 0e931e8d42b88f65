use serde_json::json;

use crate::cli::commands::DeviceCommands;
use crate::db::{connection, device_repo, user_repo};
use crate::error::SlifeError;
use crate::output;

pub fn run(cmd: DeviceCommands, json_output: bool) -> i32 {
    let result = match cmd {
        DeviceCommands::Register {
            token,
            user,
            platform,
        } => run_register(&token, &user, &platform, json_output),
        DeviceCommands::Unregister { token } => run_unregister(&token, json_output),
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

fn run_register(
    token: &str,
    user: &str,
    platform: &str,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let user = user_repo::resolve_user(&conn, user)?;
    let id = ulid::Ulid::new().to_string();
    let device = device_repo::register(&conn, &id, token, platform, &user.id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "device": {
                    "id": device.id,
                    "token": device.token,
                    "platform": device.platform,
                    "user_id": device.user_id
                }
            })))
            .unwrap()
        );
    } else {
        println!("Registered {} device for {}", device.platform, user.username);
    }
    Ok(0)
}

fn run_unregister(token: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    if !device_repo::unregister(&conn, token)? {
        return Err(SlifeError::not_found("Device token", token));
    }
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "unregistered": token
            })))
            .unwrap()
        );
    } else {
        println!("Unregistered device token");
    }
    Ok(0)
}
