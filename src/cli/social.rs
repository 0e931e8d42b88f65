use serde_json::json;

use crate::cli::commands::PostCommands;
use crate::db::{connection, social_repo, user_repo};
use crate::error::SlifeError;
use crate::models::LikeTarget;
use crate::output;
use crate::service::engagement;

pub fn run(cmd: PostCommands, json_output: bool) -> i32 {
    let result = match cmd {
        PostCommands::Create { author, text } => run_create(&author, &text, json_output),
        PostCommands::List => run_list(json_output),
        PostCommands::Show { id } => run_show(&id, json_output),
        PostCommands::Comment { post, author, text } => {
            run_comment(&post, &author, &text, json_output)
        }
        PostCommands::Like { post, by } => run_like(LikeKind::Post, &post, &by, true, json_output),
        PostCommands::Unlike { post, by } => {
            run_like(LikeKind::Post, &post, &by, false, json_output)
        }
        PostCommands::LikeComment { comment, by } => {
            run_like(LikeKind::Comment, &comment, &by, true, json_output)
        }
        PostCommands::UnlikeComment { comment, by } => {
            run_like(LikeKind::Comment, &comment, &by, false, json_output)
        }
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

enum LikeKind {
    Post,
    Comment,
}

fn run_create(author: &str, text: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let author = user_repo::resolve_user(&conn, author)?;
    let id = ulid::Ulid::new().to_string();
    let post = social_repo::create_post(&conn, &id, &author.id, text)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "post": output::json::post_json(&post)
            })))
            .unwrap()
        );
    } else {
        println!("Published post {}", post.id);
    }
    Ok(0)
}

fn run_list(json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let posts = social_repo::list_posts(&conn)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "posts": posts.iter().map(output::json::post_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_post_list(&posts);
    }
    Ok(0)
}

fn run_show(id: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let post = social_repo::resolve_post(&conn, id)?;
    let comments = social_repo::list_comments(&conn, &post.id)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "post": output::json::post_json(&post),
                "comments": comments.iter().map(output::json::comment_json).collect::<Vec<_>>()
            })))
            .unwrap()
        );
    } else {
        output::text::print_post(&post);
        output::text::print_comment_list(&comments);
    }
    Ok(0)
}

fn run_comment(post: &str, author: &str, text: &str, json_output: bool) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    let post = social_repo::resolve_post(&conn, post)?;
    let author = user_repo::resolve_user(&conn, author)?;
    let id = ulid::Ulid::new().to_string();
    let comment = social_repo::create_comment(&conn, &id, &post.id, &author.id, text)?;
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "comment": output::json::comment_json(&comment)
            })))
            .unwrap()
        );
    } else {
        println!("Commented on post {}", post.id);
    }
    Ok(0)
}

fn run_like(
    kind: LikeKind,
    reference: &str,
    by: &str,
    add: bool,
    json_output: bool,
) -> Result<i32, SlifeError> {
    let conn = connection::open_db()?;
    // Resolve prefixes up front so the like row references the full ID.
    let content_id = match kind {
        LikeKind::Post => social_repo::resolve_post(&conn, reference)?.id,
        LikeKind::Comment => social_repo::resolve_comment(&conn, reference)?.id,
    };
    let target = match kind {
        LikeKind::Post => LikeTarget::Post(&content_id),
        LikeKind::Comment => LikeTarget::Comment(&content_id),
    };
    let likes_count = if add {
        engagement::like(&conn, by, target)?
    } else {
        engagement::unlike(&conn, by, target)?
    };
    if json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&output::json::success(json!({
                "content_id": content_id,
                "likes_count": likes_count
            })))
            .unwrap()
        );
    } else {
        println!("Likes: {likes_count}");
    }
    Ok(0)
}
