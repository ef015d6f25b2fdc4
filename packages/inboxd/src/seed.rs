//! Bulk data generator for load testing: fills the configured backend with
//! random contacts and messages. Purely offline; the query engine needs no
//! coordination with it beyond eventual visibility of committed rows.

use anyhow::{Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::models::{NewContact, NewMessage};
use crate::store::ConversationStore;

const FIRST_NAMES: &[&str] = &[
    "Ada", "Alan", "Barbara", "Dennis", "Donald", "Dorothy", "Edith", "Edsger", "Frances",
    "Grace", "Hedy", "John", "Katherine", "Ken", "Leslie", "Linus", "Margaret", "Niklaus",
    "Radia", "Robin", "Sophie", "Tim", "Tony", "Vint",
];

const LAST_NAMES: &[&str] = &[
    "Allen", "Baker", "Campbell", "Carter", "Diaz", "Evans", "Foster", "Garcia", "Hall",
    "Hughes", "Jenkins", "Kim", "Lopez", "Mitchell", "Nguyen", "Okafor", "Patel", "Quinn",
    "Rivera", "Silva", "Tanaka", "Ueda", "Walsh", "Young",
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "mail.example.net"];

const PHRASES: &[&str] = &[
    "are we still on for tomorrow?",
    "just sent over the document you asked for",
    "running about ten minutes late, sorry",
    "can you call me when you get a chance?",
    "thanks again for yesterday, that was really helpful",
    "did you see the game last night?",
    "let's move the meeting to thursday afternoon",
    "the package arrived, everything looks good",
    "happy birthday! hope you have a great one",
    "I'll be out of office next week",
    "could you review the draft before friday?",
    "lunch at the usual place?",
    "the invoice has been paid, receipt attached",
    "don't forget to bring the adapter",
    "flight got delayed, landing around midnight now",
    "congrats on the new role, well deserved",
    "the numbers from last quarter look promising",
    "can we reschedule? something came up",
    "pictures from the weekend are in the shared folder",
    "reminder: dentist appointment at 9am",
    "the contractor quoted 20% less than expected",
    "what's the wifi password again?",
    "saw this and thought of you",
    "meeting notes are up, action items at the bottom",
    "heading out now, see you in twenty",
    "the build is green again, false alarm",
    "any preference for dinner on saturday?",
    "left my charger at your place, I think",
    "new phone, who dis",
    "ok",
];

pub struct SeedOptions {
    pub contacts: u64,
    pub messages: u64,
    pub batch_size: usize,
    pub rng_seed: Option<u64>,
}

pub async fn run(store: &dyn ConversationStore, opts: &SeedOptions) -> Result<()> {
    if opts.contacts == 0 && opts.messages > 0 {
        bail!("cannot generate messages without contacts");
    }

    let mut rng = match opts.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    info!("Generating {} contacts...", opts.contacts);
    let mut contact_ids = Vec::with_capacity(opts.contacts as usize);
    for i in 0..opts.contacts {
        let id = store.insert_contact(&random_contact(&mut rng, i)).await?;
        contact_ids.push(id);
        if (i + 1) % 10_000 == 0 {
            info!("  {} contacts", i + 1);
        }
    }

    info!("Generating {} messages...", opts.messages);
    let now = chrono::Utc::now().timestamp();
    let year_ago = now - 365 * 24 * 60 * 60;

    let mut batch = Vec::with_capacity(opts.batch_size);
    let mut written = 0u64;
    let mut next_report = 100_000u64;
    for _ in 0..opts.messages {
        let contact_id = contact_ids[rng.random_range(0..contact_ids.len())];
        batch.push(NewMessage {
            contact_id,
            content: PHRASES[rng.random_range(0..PHRASES.len())].to_string(),
            timestamp: rng.random_range(year_ago..=now),
        });

        if batch.len() >= opts.batch_size {
            store.insert_messages_batch(&batch).await?;
            written += batch.len() as u64;
            batch.clear();
            if written >= next_report {
                info!("  {} messages", written);
                next_report += 100_000;
            }
        }
    }
    if !batch.is_empty() {
        store.insert_messages_batch(&batch).await?;
        written += batch.len() as u64;
    }

    info!(
        "Seed complete: {} contacts, {} messages",
        contact_ids.len(),
        written
    );
    Ok(())
}

fn random_contact(rng: &mut StdRng, n: u64) -> NewContact {
    let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
    let domain = EMAIL_DOMAINS[rng.random_range(0..EMAIL_DOMAINS.len())];

    NewContact {
        name: format!("{} {}", first, last),
        // The counter keeps addresses unique across the run.
        email: format!(
            "{}.{}{}@{}",
            first.to_lowercase(),
            last.to_lowercase(),
            n,
            domain
        ),
        phone: format!(
            "+1-{:03}-{:03}-{:04}",
            rng.random_range(200..1000),
            rng.random_range(200..1000),
            rng.random_range(0..10_000)
        ),
    }
}
