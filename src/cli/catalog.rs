use serde_json::json;

use crate::cli::commands::CatalogCommands;
use crate::db::{catalog_repo, connection, user_repo};
use crate::error::SlifeError;
use crate::models::Difficulty;
use crate::output;

pub fn run(cmd: CatalogCommands, json_output: bool) -> i32 {
    let result = match cmd {
        CatalogCommands::AddSkill { title } => run_add_skill(&title, json_output),
        CatalogCommands::AddCategory { title, slug } => {
            run_add_category(&title, &slug, json_output)
        }
        CatalogCommands::AddTask {
            title,
            slug,
            description,
            short,
            hint,
            difficulty,
            category,
            reward,
            bonus,
        } => run_add_task(
            &title,
            &slug,
            &description,
            &short,
            hint.as_deref(),
            &difficulty,
            &category,
            &reward,
            &bonus,
            json_output,
        ),
        CatalogCommands::List {
            category,
            available_to,
        } => run_list(category.as_deref(), available_to.as_deref(), json_output),
        CatalogCommands::Show { reference } => run_show(&reference, json_output),
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

fn run_add_skill(title: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let id = ulid::Ulid::new().to_string();
    let skill = catalog_repo::create_skill(&conn, &id, title)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "skill": { "id": skill.id, "title": skill.title }
            })))
            .unwrap()
        );
    } else {
        println!("Added skill: {} ({})", skill.title, skill.id);
    }
    Ok(0)
}

fn run_add_category(title: &str, slug: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let id = ulid::Ulid::new().to_string();
    let category = catalog_repo::create_category(&conn, &id, title, slug)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "category": { "id": category.id, "title": category.title, "slug": category.slug }
            })))
            .unwrap()
        );
    } else {
        println!("Added category: {} ({})", category.title, category.slug);
    }
    Ok(0)
}

/// Reward spec format: `skill:quantity` for guaranteed rewards,
/// `skill:quantity:description` for bonus ones.
fn parse_reward(spec: &str, with_description: bool) -> Result<(String, i64, Option<String>), SlifeError> {
    let mut parts = spec.splitn(3, ':');
    let skill = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SlifeError::validation(format!("Invalid reward spec: {spec}")))?;
    let quantity: i64 = parts
        .next()
        .and_then(|q| q.parse().ok())
        .ok_or_else(|| SlifeError::validation(format!("Invalid reward quantity in: {spec}")))?;
    let description = parts.next().map(str::to_string);
    if with_description && description.is_none() {
        return Err(SlifeError::validation(format!(
            "Bonus reward needs a description: {spec}"
        )));
    }
    Ok((skill.to_string(), quantity, description))
}

#[allow(clippy::too_many_arguments)]
fn run_add_task(
    title: &str,
    slug: &str,
    description: &str,
    short: &str,
    hint: Option<&str>,
    difficulty: &str,
    categories: &[String],
    rewards: &[String],
    bonuses: &[String],
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let difficulty = Difficulty::from_str(difficulty)
        .ok_or_else(|| SlifeError::validation("Difficulty must be easy, medium or hard"))?;

    // Resolve references before any write, so a bad spec fails cleanly.
    let mut resolved_categories = Vec::new();
    for slug in categories {
        resolved_categories.push(catalog_repo::resolve_category(&conn, slug)?);
    }
    let mut line_items = Vec::new();
    for spec in rewards {
        let (skill_ref, quantity, _) = parse_reward(spec, false)?;
        let skill = catalog_repo::resolve_skill(&conn, &skill_ref)?;
        line_items.push((skill, quantity, false, None));
    }
    for spec in bonuses {
        let (skill_ref, quantity, desc) = parse_reward(spec, true)?;
        let skill = catalog_repo::resolve_skill(&conn, &skill_ref)?;
        line_items.push((skill, quantity, true, desc));
    }

    let task_id = ulid::Ulid::new().to_string();

    conn.execute_batch("BEGIN IMMEDIATE")?;
    let result = (|| -> Result<(), SlifeError> {
        catalog_repo::create_task(
            &conn, &task_id, title, slug, description, short, hint, difficulty,
        )?;
        for category in &resolved_categories {
            catalog_repo::add_task_category(&conn, &task_id, &category.id)?;
        }
        for (skill, quantity, is_additional, desc) in &line_items {
            catalog_repo::add_task_reward(
                &conn,
                &ulid::Ulid::new().to_string(),
                &task_id,
                &skill.id,
                *quantity,
                *is_additional,
                desc.as_deref(),
            )?;
        }
        Ok(())
    })();

    match result {
        Ok(()) => conn.execute_batch("COMMIT")?,
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }

    let task = catalog_repo::get_task_by_id(&conn, &task_id)?;
    let rewards = catalog_repo::list_task_rewards(&conn, &task_id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "task": output::json::catalog_task_json(&task, &rewards)
            })))
            .unwrap()
        );
    } else {
        println!("Added catalog task: {} ({})", task.title, task.slug);
    }
    Ok(0)
}

fn run_list(
    category: Option<&str>,
    available_to: Option<&str>,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let category_id = match category {
        Some(slug) => Some(catalog_repo::resolve_category(&conn, slug)?.id),
        None => None,
    };
    let user_id = match available_to {
        Some(reference) => Some(user_repo::resolve_user(&conn, reference)?.id),
        None => None,
    };
    let tasks = catalog_repo::list_tasks(&conn, category_id.as_deref(), user_id.as_deref())?;

    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "tasks": tasks.iter().map(output::json::catalog_task_brief_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_catalog_list(&tasks);
    }
    Ok(0)
}

fn run_show(reference: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let task = catalog_repo::resolve_task(&conn, reference)?;
    let rewards = catalog_repo::list_task_rewards(&conn, &task.id)?;
    let categories = catalog_repo::list_task_categories(&conn, &task.id)?;
    if json_output {
        let mut task_json = output::json::catalog_task_json(&task, &rewards);
        task_json["categories"] = json!(categories
            .iter()
            .map(|c| c.slug.as_str())
            .collect::<Vec<_>>());
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({ "task": task_json })))
                .unwrap()
        );
    } else {
        output::text::print_catalog_task(&task, &rewards);
    }
    Ok(0)
}
