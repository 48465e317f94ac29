//! End-to-end flows through `Router` with in-memory stores and fake
//! transport / access collaborators.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDateTime, TimeDelta};

use tickler_conversation::ConversationState;
use tickler_core::config::{BotConfig, SchedulerConfig};
use tickler_core::due::parse_due;
use tickler_core::transport::{Access, Button, Transport, TransportError};
use tickler_core::{Channel, MessageRef, OwnerId, ReminderId, Sender, UserId};
use tickler_router::{Inbound, Router};
use tickler_scheduler::Scheduler;
use tickler_store::db::open_in_memory;
use tickler_store::{ChannelStore, ReminderStore};

const ADMIN: u64 = 1;
const USER: u64 = 2;
const OTHER: u64 = 3;

#[derive(Default)]
struct FakeTransport {
    sent: Mutex<Vec<(OwnerId, String, Vec<Button>)>>,
    edits: Mutex<Vec<(MessageRef, String)>>,
}

impl FakeTransport {
    fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t, _)| t.clone()).collect()
    }

    fn last_sent(&self) -> (String, Vec<Button>) {
        let sent = self.sent.lock().unwrap();
        let (_, text, buttons) = sent.last().expect("nothing sent");
        (text.clone(), buttons.clone())
    }

    fn last_edit(&self) -> String {
        self.edits.lock().unwrap().last().expect("nothing edited").1.clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(
        &self,
        recipient: OwnerId,
        text: &str,
        buttons: &[Button],
    ) -> Result<MessageRef, TransportError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((recipient, text.to_string(), buttons.to_vec()));
        Ok(MessageRef {
            chat: recipient,
            message_id: sent.len() as i32,
        })
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        _buttons: &[Button],
    ) -> Result<(), TransportError> {
        self.edits.lock().unwrap().push((message, text.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeAccess {
    members: Mutex<HashSet<u64>>,
}

impl FakeAccess {
    fn join(&self, user: u64) {
        self.members.lock().unwrap().insert(user);
    }
}

#[async_trait]
impl Access for FakeAccess {
    async fn is_member(&self, _channels: &[Channel], user: UserId) -> bool {
        self.members.lock().unwrap().contains(&user.0)
    }

    fn is_admin(&self, user: UserId) -> bool {
        user.0 == ADMIN
    }
}

struct Harness {
    router: Router,
    transport: Arc<FakeTransport>,
    access: Arc<FakeAccess>,
    scheduler: Arc<Scheduler>,
    channels: Arc<ChannelStore>,
}

fn harness_with(bot: BotConfig) -> Harness {
    let transport = Arc::new(FakeTransport::default());
    let access = Arc::new(FakeAccess::default());
    let reminders = Arc::new(ReminderStore::new(open_in_memory().unwrap()));
    let channels = Arc::new(ChannelStore::new(open_in_memory().unwrap()));
    let scheduler = Scheduler::new(reminders, transport.clone(), SchedulerConfig::default());
    let router = Router::new(
        Arc::clone(&scheduler),
        Arc::clone(&channels),
        transport.clone(),
        access.clone(),
        &bot,
    );
    Harness {
        router,
        transport,
        access,
        scheduler,
        channels,
    }
}

fn harness() -> Harness {
    harness_with(BotConfig::default())
}

fn sender(user: u64) -> Sender {
    Sender::new(user, user as i64 * 100)
}

fn message(user: u64) -> MessageRef {
    MessageRef {
        chat: sender(user).chat,
        message_id: 1,
    }
}

fn now() -> NaiveDateTime {
    parse_due("2025-03-01 08:50").unwrap()
}

impl Harness {
    async fn text(&self, user: u64, text: &str) {
        self.router.handle_text(sender(user), text).await.unwrap();
    }

    async fn press(&self, user: u64, action_id: &str) {
        self.router
            .handle_action(sender(user), action_id, message(user))
            .await
            .unwrap();
    }

    async fn state(&self, user: u64) -> ConversationState {
        self.router.conversations().current(UserId(user)).await
    }

    fn reminders_of(&self, user: u64) -> Vec<tickler_core::Reminder> {
        self.scheduler.store().list(sender(user).chat).unwrap()
    }

    fn add_reminder(&self, user: u64, text: &str, offset_secs: i64) -> ReminderId {
        self.scheduler
            .store()
            .create(sender(user).chat, text, now() + TimeDelta::seconds(offset_secs))
            .unwrap()
    }
}

// --- set-reminder flow -----------------------------------------------------

#[tokio::test]
async fn set_reminder_flow_creates_exactly_one_reminder() {
    let h = harness();

    h.text(USER, "/setreminder").await;
    assert_eq!(h.state(USER).await, ConversationState::AwaitingReminderText);
    assert_eq!(h.transport.last_sent().0, "Please enter the text of the reminder:");

    h.text(USER, "Buy milk").await;
    assert_eq!(
        h.state(USER).await,
        ConversationState::AwaitingReminderDate {
            text: "Buy milk".into()
        }
    );

    h.text(USER, "2025-03-01 09:00").await;
    assert_eq!(h.state(USER).await, ConversationState::Idle);
    assert_eq!(h.transport.last_sent().0, "Reminder set successfully!");

    let reminders = h.reminders_of(USER);
    assert_eq!(reminders.len(), 1);
    assert_eq!(reminders[0].text, "Buy milk");
    assert_eq!(reminders[0].due_at, "2025-03-01 09:00:00");
    assert_eq!(reminders[0].owner, sender(USER).chat);
}

#[tokio::test]
async fn set_reminder_button_enters_flow() {
    let h = harness();
    h.press(USER, "press_button").await;

    assert_eq!(h.state(USER).await, ConversationState::AwaitingReminderText);
    assert_eq!(h.transport.last_edit(), "Please enter the text of the reminder:");
}

#[tokio::test]
async fn unparseable_date_keeps_pending_text() {
    let h = harness();
    h.text(USER, "/setreminder").await;
    h.text(USER, "Buy milk").await;

    h.text(USER, "tomorrow").await;
    assert_eq!(
        h.transport.last_sent().0,
        "Invalid date format. Please use YYYY-MM-DD HH:MM."
    );
    assert_eq!(
        h.state(USER).await,
        ConversationState::AwaitingReminderDate {
            text: "Buy milk".into()
        }
    );
    assert!(h.reminders_of(USER).is_empty());

    // A retry with a valid date still completes the flow.
    h.text(USER, "2025-03-01 09:00").await;
    assert_eq!(h.reminders_of(USER).len(), 1);
}

#[tokio::test]
async fn entering_set_reminder_overwrites_pending_flow() {
    let h = harness();
    h.text(USER, "/setreminder").await;
    h.text(USER, "Buy milk").await;

    h.text(USER, "/setreminder").await;
    assert_eq!(h.state(USER).await, ConversationState::AwaitingReminderText);
}

#[tokio::test]
async fn idle_text_gets_hint() {
    let h = harness();
    h.text(USER, "hello there").await;

    assert!(h.transport.last_sent().0.contains("/setreminder"));
    assert_eq!(h.state(USER).await, ConversationState::Idle);
}

#[tokio::test]
async fn cancel_resets_pending_flow() {
    let h = harness();
    h.text(USER, "/setreminder").await;
    h.text(USER, "/cancel").await;

    assert_eq!(h.state(USER).await, ConversationState::Idle);
    assert_eq!(h.transport.last_sent().0, "Cancelled.");

    h.text(USER, "/cancel").await;
    assert_eq!(h.transport.last_sent().0, "Nothing to cancel.");
}

// --- channel links ---------------------------------------------------------

#[tokio::test]
async fn admin_link_during_date_entry_registers_channel() {
    let h = harness();
    h.text(ADMIN, "/setreminder").await;
    h.text(ADMIN, "Buy milk").await;

    h.text(ADMIN, "https://t.me/news").await;

    let channels = h.channels.list().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].link, "https://t.me/news");
    assert_eq!(h.state(ADMIN).await, ConversationState::Idle);
    assert!(h.reminders_of(ADMIN).is_empty());
    assert_eq!(
        h.transport.last_sent().0,
        "Channel link saved successfully: https://t.me/news"
    );
}

#[tokio::test]
async fn non_admin_link_is_rejected_without_state_change() {
    let h = harness();
    h.text(USER, "/setreminder").await;
    h.text(USER, "Buy milk").await;

    h.text(USER, "https://t.me/news").await;

    assert_eq!(h.transport.last_sent().0, "Invalid command or unauthorized.");
    assert!(h.channels.list().unwrap().is_empty());
    assert!(h.reminders_of(USER).is_empty());
    assert_eq!(
        h.state(USER).await,
        ConversationState::AwaitingReminderDate {
            text: "Buy milk".into()
        }
    );
}

#[tokio::test]
async fn admin_link_while_idle_starts_gating_everyone_else() {
    let h = harness();

    h.text(ADMIN, "https://t.me/news").await;
    assert_eq!(h.channels.list().unwrap().len(), 1);
    assert_eq!(h.state(ADMIN).await, ConversationState::Idle);

    h.text(USER, "/setreminder").await;
    assert!(h.transport.last_sent().0.contains("join all specified channels"));
    assert_eq!(h.state(USER).await, ConversationState::Idle);
}

#[tokio::test]
async fn idle_link_is_stray_text_when_override_disabled() {
    let h = harness_with(BotConfig {
        link_override: false,
        ..BotConfig::default()
    });

    h.text(ADMIN, "https://t.me/news").await;

    assert!(h.channels.list().unwrap().is_empty());
}

#[tokio::test]
async fn link_is_a_date_attempt_when_override_disabled() {
    let h = harness_with(BotConfig {
        link_override: false,
        ..BotConfig::default()
    });
    h.text(ADMIN, "/setreminder").await;
    h.text(ADMIN, "Buy milk").await;

    h.text(ADMIN, "https://t.me/news").await;

    assert!(h.channels.list().unwrap().is_empty());
    assert_eq!(
        h.transport.last_sent().0,
        "Invalid date format. Please use YYYY-MM-DD HH:MM."
    );
}

#[tokio::test]
async fn add_channel_command_is_admin_only() {
    let h = harness();

    h.text(USER, "/addchannel").await;
    assert_eq!(
        h.transport.last_sent().0,
        "You are not authorized to use this command."
    );
    assert_eq!(h.state(USER).await, ConversationState::Idle);

    h.text(ADMIN, "/addchannel").await;
    assert_eq!(h.state(ADMIN).await, ConversationState::AwaitingChannelLink);
    h.text(ADMIN, "@news").await;
    assert_eq!(h.channels.list().unwrap()[0].link, "@news");
    assert_eq!(h.state(ADMIN).await, ConversationState::Idle);
}

#[tokio::test]
async fn remove_channel_flow() {
    let h = harness();
    let id = h.channels.add("https://t.me/news").unwrap();

    h.text(USER, "/removechannel").await;
    assert_eq!(
        h.transport.last_sent().0,
        "You are not authorized to remove channels."
    );

    h.text(ADMIN, "/removechannel").await;
    let (text, buttons) = h.transport.last_sent();
    assert_eq!(text, "Select a channel to remove:");
    assert_eq!(
        buttons,
        vec![Button::action("Remove https://t.me/news", format!("remove_channel_{id}"))]
    );

    h.press(USER, &format!("remove_channel_{id}")).await;
    assert_eq!(h.channels.list().unwrap().len(), 1);

    h.press(ADMIN, &format!("remove_channel_{id}")).await;
    assert_eq!(h.transport.last_edit(), format!("Channel ({id}) removed successfully."));
    assert!(h.channels.list().unwrap().is_empty());
}

// --- button actions --------------------------------------------------------

#[tokio::test]
async fn done_on_armed_reminder_deletes_and_disarms() {
    let h = harness();
    let id = h.add_reminder(USER, "Buy milk", 600);
    h.scheduler.scan(now()).unwrap();
    assert!(h.scheduler.is_armed(id));

    h.press(USER, &format!("done_{id}")).await;

    assert_eq!(h.transport.last_edit(), format!("Reminder ({id}) marked as done."));
    assert!(!h.scheduler.is_armed(id));
    assert!(h.reminders_of(USER).is_empty());

    h.scheduler.scan(now()).unwrap();
    assert!(!h.scheduler.is_armed(id));
}

#[tokio::test]
async fn done_on_unarmed_reminder_is_a_notice() {
    let h = harness();
    let id = h.add_reminder(USER, "Far away", 86_400);

    h.press(USER, &format!("done_{id}")).await;

    assert_eq!(
        h.transport.last_edit(),
        format!("No associated job found for reminder ID {id}.")
    );
    assert_eq!(h.reminders_of(USER).len(), 1);
}

#[tokio::test]
async fn done_on_foreign_reminder_changes_nothing() {
    let h = harness();
    let id = h.add_reminder(USER, "Buy milk", 600);
    h.scheduler.scan(now()).unwrap();

    h.press(OTHER, &format!("done_{id}")).await;

    assert!(h.scheduler.is_armed(id));
    assert_eq!(h.reminders_of(USER).len(), 1);
}

#[tokio::test]
async fn delete_is_owner_checked() {
    let h = harness();
    let id = h.add_reminder(USER, "Buy milk", 600);
    h.scheduler.scan(now()).unwrap();

    h.press(OTHER, &format!("delete_{id}")).await;
    assert_eq!(h.transport.last_edit(), format!("Reminder ({id}) not found."));
    assert_eq!(h.reminders_of(USER).len(), 1);

    h.press(USER, &format!("delete_{id}")).await;
    assert_eq!(
        h.transport.last_edit(),
        format!("Reminder ({id}) deleted successfully.")
    );
    assert!(h.reminders_of(USER).is_empty());
    assert!(!h.scheduler.is_armed(id));
}

#[tokio::test]
async fn delete_command_lists_own_reminders() {
    let h = harness();
    h.text(USER, "/deletereminder").await;
    assert_eq!(h.transport.last_sent().0, "You have no reminders to delete.");

    let id = h.add_reminder(USER, "Buy milk", 600);
    h.add_reminder(OTHER, "Not mine", 600);
    h.text(USER, "/deletereminder").await;

    let (text, buttons) = h.transport.last_sent();
    assert_eq!(text, "Select a reminder to delete:");
    assert_eq!(buttons, vec![Button::action(format!("Delete {id}"), format!("delete_{id}"))]);
}

#[tokio::test]
async fn my_reminders_button_lists_reminders() {
    let h = harness();
    let id = h.add_reminder(USER, "Buy milk", 600);

    h.press(USER, "my_reminders").await;

    let (text, buttons) = h.transport.last_sent();
    assert_eq!(
        text,
        format!("Your reminders:\n{id}. Buy milk - 2025-03-01 09:00:00\n")
    );
    assert_eq!(buttons.len(), 1);
}

#[tokio::test]
async fn restart_resets_state_and_shows_welcome() {
    let h = harness();
    h.text(USER, "/setreminder").await;

    h.press(USER, "restart").await;

    assert_eq!(h.state(USER).await, ConversationState::Idle);
    let texts = h.transport.texts();
    assert_eq!(texts[texts.len() - 2], "Restarting...");
    let (welcome, buttons) = h.transport.last_sent();
    assert!(welcome.starts_with("Welcome!"));
    assert_eq!(buttons.len(), 2);
}

#[tokio::test]
async fn malformed_callbacks_get_a_diagnostic() {
    let h = harness();
    for payload in ["bogus_7", "done_abc", "done_1_2", ""] {
        h.press(USER, payload).await;
        assert_eq!(h.transport.last_edit(), format!("Invalid button callback: {payload}"));
    }
    assert_eq!(h.state(USER).await, ConversationState::Idle);
}

#[tokio::test]
async fn inbound_events_dispatch() {
    let h = harness();
    h.router
        .handle(Inbound::Text {
            sender: sender(USER),
            text: "/setreminder".into(),
        })
        .await
        .unwrap();
    h.router
        .handle(Inbound::Action {
            sender: sender(USER),
            action_id: "my_reminders".into(),
            message: message(USER),
        })
        .await
        .unwrap();

    assert_eq!(h.state(USER).await, ConversationState::AwaitingReminderText);
    assert_eq!(h.transport.last_sent().0, "You have no reminders.");
}

// --- membership gating -----------------------------------------------------

#[tokio::test]
async fn non_members_get_the_join_screen() {
    let h = harness();
    h.channels.add("https://t.me/news").unwrap();
    h.channels.add("@updates").unwrap();

    h.text(USER, "/start").await;
    let (text, buttons) = h.transport.last_sent();
    assert!(text.contains("join all specified channels"));
    assert_eq!(
        buttons,
        vec![
            Button::link("Join Channel 1", "https://t.me/news"),
            Button::link("Join Channel 2", "https://t.me/updates"),
        ]
    );

    h.text(USER, "/setreminder").await;
    assert_eq!(h.state(USER).await, ConversationState::Idle);

    h.access.join(USER);
    h.text(USER, "/setreminder").await;
    assert_eq!(h.state(USER).await, ConversationState::AwaitingReminderText);
}

#[tokio::test]
async fn admins_bypass_gating() {
    let h = harness();
    h.channels.add("https://t.me/news").unwrap();

    h.text(ADMIN, "/start").await;
    let (text, _) = h.transport.last_sent();
    assert!(text.contains("You are an admin"));
}

#[tokio::test]
async fn done_stays_available_to_non_members() {
    let h = harness();
    let id = h.add_reminder(USER, "Buy milk", 600);
    h.scheduler.scan(now()).unwrap();
    h.channels.add("https://t.me/news").unwrap();

    h.press(USER, &format!("done_{id}")).await;

    assert_eq!(h.transport.last_edit(), format!("Reminder ({id}) marked as done."));
}

// --- concurrency -----------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_users_keep_separate_state() {
    let h = Arc::new(harness());
    h.text(USER, "/setreminder").await;
    h.text(USER, "Buy milk").await;

    let a = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.text(USER, "2025-03-01 09:00").await })
    };
    let b = {
        let h = Arc::clone(&h);
        tokio::spawn(async move { h.text(OTHER, "2025-03-01 09:00").await })
    };
    a.await.unwrap();
    b.await.unwrap();

    assert_eq!(h.reminders_of(USER).len(), 1);
    assert!(h.reminders_of(OTHER).is_empty());
    assert_eq!(h.state(OTHER).await, ConversationState::Idle);
}
