use serde_json::{json, Value};

use crate::error::SlifeError;
use crate::models::{CatalogTask, Comment, Post, TaskReward, User, UserSkill, UserTask};

pub fn success(data: Value) -> Value {
    json!({
        "success": true,
        "data": data
    })
}

pub fn error(err: &SlifeError) -> Value {
    json!({
        "success": false,
        "error": {
            "code": err.code.as_str(),
            "message": err.message
        }
    })
}

pub fn user_json(u: &User) -> Value {
    json!({
        "id": u.id,
        "username": u.username,
        "created_at": u.created_at
    })
}

pub fn user_skill_json(s: &UserSkill) -> Value {
    json!({
        "skill": s.skill_title,
        "level": s.level,
        "experience": s.experience
    })
}

pub fn catalog_task_json(t: &CatalogTask, rewards: &[TaskReward]) -> Value {
    let guaranteed: Vec<Value> = rewards
        .iter()
        .filter(|r| !r.is_additional)
        .map(reward_json)
        .collect();
    let additional: Vec<Value> = rewards
        .iter()
        .filter(|r| r.is_additional)
        .map(reward_json)
        .collect();
    json!({
        "id": t.id,
        "title": t.title,
        "slug": t.slug,
        "description": t.description,
        "short_description": t.short_description,
        "hint": t.hint,
        "difficulty": t.difficulty.as_str(),
        "rewards": guaranteed,
        "additional_rewards": additional
    })
}

pub fn catalog_task_brief_json(t: &CatalogTask) -> Value {
    json!({
        "id": t.id,
        "title": t.title,
        "slug": t.slug,
        "short_description": t.short_description,
        "difficulty": t.difficulty.as_str()
    })
}

fn reward_json(r: &TaskReward) -> Value {
    let mut v = json!({
        "skill": r.skill_title,
        "quantity": r.quantity
    });
    if let Some(ref desc) = r.description {
        v["description"] = json!(desc);
    }
    v
}

pub fn instance_json(i: &UserTask) -> Value {
    json!({
        "id": i.id,
        "task_id": i.task_id,
        "initiator_id": i.initiator_id,
        "target_user_id": i.target_user_id,
        "target_user_name": i.target_user_name,
        "status": i.status.as_str(),
        "invitation_token": i.invitation_token,
        "rating": i.rating,
        "started_at": i.started_at,
        "completed_at": i.completed_at,
        "confirmed_at": i.confirmed_at
    })
}

pub fn post_json(p: &Post) -> Value {
    json!({
        "id": p.id,
        "author_id": p.author_id,
        "text": p.text,
        "likes_count": p.likes_count,
        "pub_date": p.pub_date
    })
}

pub fn comment_json(c: &Comment) -> Value {
    json!({
        "id": c.id,
        "post_id": c.post_id,
        "author_id": c.author_id,
        "text": c.text,
        "likes_count": c.likes_count,
        "pub_date": c.pub_date
    })
}
