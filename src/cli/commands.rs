use clap::{Parser, Subcommand};

const VERSION: &str = env!("GIT_VERSION");

#[derive(Parser)]
#[command(
    name = "slife",
    version = VERSION,
    about = "Social challenge-exchange backend CLI",
    after_help = "\
NOTE:
  DB is stored at ./.slife/slife.db (override with SLIFE_DB).
  Run `slife init` before any other command.

TASK LIFECYCLE:
  started -> completed -> confirmed, with canceled as the alternate terminal
  state. The initiator starts and completes; the target (or an invitation-
  token holder) confirms. Confirmation subscribes both parties to each other.

INVITATIONS:
  Tasks started without a target are open: anyone with the invitation token
  may claim (`invite accept`) and confirm (`invite confirm`) them, even
  without an account. Registering with `--session` later reattributes those
  confirmations to the new account."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the slife database
    Init,

    /// User accounts and subscriptions
    #[command(subcommand)]
    User(UserCommands),

    /// Catalog administration and browsing
    #[command(subcommand)]
    Catalog(CatalogCommands),

    /// Task instance lifecycle
    #[command(subcommand)]
    Task(TaskCommands),

    /// Invitation-link flow for anonymous targets
    #[command(subcommand)]
    Invite(InviteCommands),

    /// Push-notification device tokens
    #[command(subcommand)]
    Device(DeviceCommands),

    /// Social feed: posts, comments, likes
    #[command(subcommand)]
    Post(PostCommands),
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a user account
    Add {
        username: String,
        /// Anonymous session whose confirmed tasks should be merged in
        #[arg(long)]
        session: Option<String>,
    },
    /// List all users
    List,
    /// Show a user and their skills
    Show {
        /// Username or ID
        reference: String,
    },
    /// Subscribe to another user
    Subscribe {
        user: String,
        author: String,
    },
    /// Remove a subscription
    Unsubscribe {
        user: String,
        author: String,
    },
    /// List a user's subscriptions
    Subscriptions {
        user: String,
    },
}

#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Add a reward skill (admin)
    AddSkill { title: String },
    /// Add a task category (admin)
    AddCategory { title: String, slug: String },
    /// Add a catalog task (admin)
    AddTask {
        title: String,
        slug: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        short: String,
        #[arg(long)]
        hint: Option<String>,
        /// easy, medium or hard
        #[arg(long, default_value = "easy")]
        difficulty: String,
        /// Category slug, repeatable
        #[arg(long)]
        category: Vec<String>,
        /// Guaranteed reward as skill:quantity, repeatable
        #[arg(long)]
        reward: Vec<String>,
        /// Bonus reward as skill:quantity:description, repeatable
        #[arg(long)]
        bonus: Vec<String>,
    },
    /// List catalog tasks
    List {
        /// Filter by category slug
        #[arg(long)]
        category: Option<String>,
        /// Hide tasks this user already holds
        #[arg(long, value_name = "USER")]
        available_to: Option<String>,
    },
    /// Show a catalog task with its rewards
    Show {
        /// Slug or ID
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Start a catalog task (started)
    Start {
        /// Catalog task slug or ID
        task: String,
        /// Initiating user
        #[arg(long)]
        by: String,
        /// Target a registered user
        #[arg(long)]
        target: Option<String>,
        /// Or name a target who is not a member yet
        #[arg(long)]
        target_name: Option<String>,
    },
    /// Mark a task done (started -> completed), notifying the target
    Complete {
        id: String,
        #[arg(long)]
        by: String,
    },
    /// Confirm a completed task (completed -> confirmed)
    Confirm {
        id: String,
        /// Confirming user
        #[arg(long)]
        by: String,
        /// Invitation token, required when no target user is bound
        #[arg(long)]
        token: Option<String>,
        /// Rating 1-5 for the initiator
        #[arg(long)]
        rating: Option<String>,
    },
    /// Cancel a non-terminal task
    Cancel {
        id: String,
        #[arg(long)]
        by: String,
    },
    /// List a user's task instances
    List {
        #[arg(long)]
        by: String,
    },
    /// Show one task instance
    Show { id: String },
}

#[derive(Subcommand)]
pub enum InviteCommands {
    /// Claim an open invitation link as an anonymous session
    Accept {
        token: String,
        /// Existing anonymous session id; minted when absent
        #[arg(long)]
        session: Option<String>,
    },
    /// Confirm a completed task from an anonymous session
    Confirm {
        token: String,
        #[arg(long)]
        session: String,
        /// Rating 1-5 for the initiator
        #[arg(long)]
        rating: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum DeviceCommands {
    /// Register (or reassign) a push token
    Register {
        token: String,
        #[arg(long)]
        user: String,
        #[arg(long, default_value = "android")]
        platform: String,
    },
    /// Remove a push token
    Unregister { token: String },
}

#[derive(Subcommand)]
pub enum PostCommands {
    /// Publish a post
    Create {
        #[arg(long)]
        author: String,
        text: String,
    },
    /// List published posts
    List,
    /// Show a post with its comments
    Show { id: String },
    /// Comment on a post
    Comment {
        post: String,
        #[arg(long)]
        author: String,
        text: String,
    },
    /// Like a post
    Like {
        post: String,
        #[arg(long)]
        by: String,
    },
    /// Remove a like from a post
    Unlike {
        post: String,
        #[arg(long)]
        by: String,
    },
    /// Like a comment
    LikeComment {
        comment: String,
        #[arg(long)]
        by: String,
    },
    /// Remove a like from a comment
    UnlikeComment {
        comment: String,
        #[arg(long)]
        by: String,
    },
}
