use serde::Serialize;
use sqlx::PgPool;

use crate::auth::hash_password;
use crate::cli::OutputFormat;
use crate::database::models::{Chat, Message, NewChat, NewMessage, NewUser, User};

const SEED_PASSWORD: &str = "test";
const MESSAGES_PER_CHAT: usize = 10;

const WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do", "eiusmod",
    "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua",
];

#[derive(Debug, Default, Serialize)]
pub struct SeedReport {
    pub users_created: usize,
    pub chats_created: usize,
    pub messages_created: usize,
    pub skipped: bool,
}

struct SeedUser {
    username: &'static str,
    is_staff: bool,
    is_superuser: bool,
}

const SEED_USERS: [SeedUser; 4] = [
    SeedUser { username: "admin", is_staff: true, is_superuser: true },
    SeedUser { username: "staff", is_staff: true, is_superuser: false },
    SeedUser { username: "user", is_staff: false, is_superuser: false },
    SeedUser { username: "another_user", is_staff: false, is_superuser: false },
];

pub async fn handle(pool: &PgPool, output_format: OutputFormat) -> anyhow::Result<()> {
    let report = seed(pool).await?;
    let text = if report.skipped {
        "Database already populated.".to_string()
    } else {
        format!(
            "Seeded {} users, {} chats, {} messages",
            report.users_created, report.chats_created, report.messages_created
        )
    };
    output_format.print(&text, &report)
}

/// Ensure the demo accounts exist, then create two chats of alternating
/// staff/owner messages unless any chat exists already.
pub async fn seed(pool: &PgPool) -> anyhow::Result<SeedReport> {
    let mut report = SeedReport::default();
    let mut users = Vec::with_capacity(SEED_USERS.len());

    for seed_user in &SEED_USERS {
        let user = match User::find_by_username(pool, seed_user.username).await? {
            Some(user) => user,
            None => {
                report.users_created += 1;
                User::insert(
                    pool,
                    &NewUser {
                        username: seed_user.username.to_string(),
                        password_hash: hash_password(SEED_PASSWORD)?,
                        email: String::new(),
                        is_staff: seed_user.is_staff,
                        is_superuser: seed_user.is_superuser,
                    },
                )
                .await?
            }
        };
        users.push(user);
    }

    if Chat::count_all(pool).await? > 0 {
        report.skipped = true;
        return Ok(report);
    }

    let staff = &users[1];
    let mut tx = pool.begin().await?;
    for owner in [&users[2], &users[3]] {
        let chat = Chat::insert(&mut *tx, &NewChat { user_id: owner.id }).await?;
        report.chats_created += 1;

        for i in 0..MESSAGES_PER_CHAT {
            let author = if i % 2 == 0 { staff } else { owner };
            let new_message = NewMessage {
                user_id: author.id,
                chat_id: chat.id,
                content: filler_sentence(chat.id as usize + i),
            };
            Message::insert(&mut *tx, &new_message).await?;
            report.messages_created += 1;
        }
    }
    tx.commit().await?;

    Ok(report)
}

/// Deterministic 5-15 word filler text
fn filler_sentence(seed: usize) -> String {
    let len = 5 + seed % 11;
    (0..len)
        .map(|i| WORDS[(seed * 7 + i * 3) % WORDS.len()])
        .collect::<Vec<_>>()
        .join(" ")
}
