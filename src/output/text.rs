use crate::models::{CatalogTask, Comment, Post, TaskReward, User, UserSkill, UserTask};

pub fn print_user(u: &User) {
    println!("User: {} ({})", u.username, u.id);
    println!("  Registered: {}", u.created_at);
}

pub fn print_user_list(users: &[User]) {
    if users.is_empty() {
        println!("No users found.");
        return;
    }
    for u in users {
        println!("  {} ({})", u.username, short_id(&u.id));
    }
}

pub fn print_user_skills(skills: &[UserSkill]) {
    if skills.is_empty() {
        println!("No skills yet.");
        return;
    }
    for s in skills {
        println!("  {} - level {} ({} xp)", s.skill_title, s.level, s.experience);
    }
}

pub fn print_catalog_task(t: &CatalogTask, rewards: &[TaskReward]) {
    println!("Task: {} [{}]", t.title, t.difficulty.as_str());
    println!("  Slug: {}", t.slug);
    println!("  {}", t.description);
    if let Some(ref hint) = t.hint {
        println!("  Hint: {hint}");
    }
    let (guaranteed, additional): (Vec<_>, Vec<_>) =
        rewards.iter().partition(|r| !r.is_additional);
    if !guaranteed.is_empty() {
        println!("  Rewards:");
        for r in guaranteed {
            println!("    {} x{}", r.skill_title, r.quantity);
        }
    }
    if !additional.is_empty() {
        println!("  Bonus rewards:");
        for r in additional {
            let desc = r.description.as_deref().unwrap_or("");
            println!("    {} x{} - {desc}", r.skill_title, r.quantity);
        }
    }
}

pub fn print_catalog_list(tasks: &[CatalogTask]) {
    if tasks.is_empty() {
        println!("No tasks available.");
        return;
    }
    for t in tasks {
        println!(
            "  [{}] {} ({}) - {}",
            t.difficulty.as_str(),
            t.title,
            t.slug,
            t.short_description
        );
    }
}

pub fn print_instance(i: &UserTask) {
    println!("Task instance {} [{}]", i.id, i.status.as_str());
    let target = i
        .target_user_id
        .as_deref()
        .or(i.target_user_name.as_deref())
        .unwrap_or("(open invitation)");
    println!("  Target: {target}");
    println!("  Invitation token: {}", i.invitation_token);
    if let Some(rating) = i.rating {
        println!("  Rating: {rating}/5");
    }
    println!("  Started: {}", i.started_at);
    if let Some(ref completed) = i.completed_at {
        println!("  Completed: {completed}");
    }
    if let Some(ref confirmed) = i.confirmed_at {
        println!("  Confirmed: {confirmed}");
    }
}

pub fn print_instance_list(instances: &[UserTask]) {
    if instances.is_empty() {
        println!("No task instances.");
        return;
    }
    for i in instances {
        println!("  [{}] {}", i.status.as_str(), short_id(&i.id));
    }
}

pub fn print_post(p: &Post) {
    println!("Post {} by {}", short_id(&p.id), p.author_id);
    println!("  {}", p.text);
    println!("  Likes: {}  ({})", p.likes_count, p.pub_date);
}

pub fn print_post_list(posts: &[Post]) {
    if posts.is_empty() {
        println!("No posts yet.");
        return;
    }
    for p in posts {
        println!("  {} - {} (likes: {})", short_id(&p.id), p.text, p.likes_count);
    }
}

pub fn print_comment_list(comments: &[Comment]) {
    for c in comments {
        println!("  {} - {} (likes: {})", short_id(&c.id), c.text, c.likes_count);
    }
}

fn short_id(id: &str) -> &str {
    &id[..std::cmp::min(8, id.len())]
}
