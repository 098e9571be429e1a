mod common;

use common::{api_at, api_with_link_delay, PASSWORD};
use investwise::api::Api;
use investwise::cli::Console;
use investwise::db::Db;
use investwise::models::AssetKind;
use rust_decimal_macros::dec;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::watch;

async fn run_script(dir: &Path, script: &str) -> (Api, String) {
    let api = api_at(dir).await;
    let (_interrupt_tx, interrupt_rx) = watch::channel(());
    let mut console = Console::new(api, script.as_bytes(), Vec::new(), interrupt_rx);
    console.run().await.unwrap();
    let (api, output) = console.into_parts();
    (api, String::from_utf8(output).unwrap())
}

fn sign_up_lines(username: &str) -> String {
    format!(
        "1\n{}\nAlice\nalice@example.com\n{}\n",
        username, PASSWORD
    )
}

fn login_lines(username: &str) -> String {
    format!("2\n{}\n{}\n", username, PASSWORD)
}

/// Operator side of a console wired through in-memory pipes, for sessions
/// that need to react to what the console has printed.
struct Terminal {
    keyboard: DuplexStream,
    screen: DuplexStream,
    transcript: String,
    cursor: usize,
}

impl Terminal {
    async fn type_text(&mut self, text: &str) {
        self.keyboard.write_all(text.as_bytes()).await.unwrap();
    }

    /// Reads console output until `marker` appears past everything already waited for.
    async fn wait_for(&mut self, marker: &str) {
        loop {
            if let Some(pos) = self.transcript[self.cursor..].find(marker) {
                self.cursor += pos + marker.len();
                return;
            }
            let mut buf = [0u8; 1024];
            let n = self.screen.read(&mut buf).await.unwrap();
            assert!(n > 0, "console output ended before {:?}", marker);
            self.transcript.push_str(&String::from_utf8_lossy(&buf[..n]));
        }
    }
}

fn attach(
    api: Api,
    interrupts: watch::Receiver<()>,
) -> (Console<BufReader<DuplexStream>, DuplexStream>, Terminal) {
    let (keyboard, console_in) = tokio::io::duplex(1 << 16);
    let (console_out, screen) = tokio::io::duplex(1 << 16);
    let console = Console::new(api, BufReader::new(console_in), console_out, interrupts);
    let terminal = Terminal {
        keyboard,
        screen,
        transcript: String::new(),
        cursor: 0,
    };
    (console, terminal)
}

#[tokio::test]
async fn full_session_with_zakat() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        login_lines("alice"),
        "2\nstock\n10\n".to_string(),
        "2\nGOLD\n2\n".to_string(),
        "1\n".to_string(),
        "4\nY\n".to_string(),
        "3\n0\nE\n20\n".to_string(),
        "1\n".to_string(),
        "6\n3\n".to_string(),
    ]
    .concat();

    let (api, output) = run_script(dir.path(), &script).await;

    assert!(output.contains("Sign-up successful! You can now login."));
    assert!(output.contains("Login successful! Welcome, Alice."));
    assert!(output.contains("0: STOCK - Quantity: 10.00, Value: $1,500.00"));
    assert!(output.contains("1: GOLD - Quantity: 2.00, Value: $3,600.00"));
    assert!(output.contains("Total Portfolio Value: $5,100.00"));
    assert!(output.contains("- STOCK: $1,500.00"));
    assert!(output.contains("Zakat Due (2.5%): $127.50"));
    assert!(output.contains("PDF report generated (simulated)!"));
    assert!(output.contains("Asset updated!"));
    assert!(output.contains("Total Portfolio Value: $6,600.00"));
    assert!(output.contains("Logged out successfully."));
    assert!(output.ends_with("Thank you for using InvestWise!\n"));

    let (session, _) = api.login("alice", PASSWORD).unwrap();
    assert_eq!(api.portfolio(&session).unwrap().total_value, dec!(6600));
    assert_eq!(&Db::new(dir.path()).load().await.unwrap(), api.state());
}

#[tokio::test]
async fn invalid_inputs_are_reprompted() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        "abc\n9\n-1\n".to_string(),
        "1\n\nalice\n\nAlice\nnot-an-email\nalice@example.com\nshort\npassword123\n".to_string(),
        login_lines("alice"),
        "2\nbonds\ncrypto\n-1\nzero\n0.5\n".to_string(),
        "3\n5\n-1\n".to_string(),
        "3\n0\nX\n".to_string(),
        "3\n0\nR\n".to_string(),
        "4\n".to_string(),
    ]
    .concat();

    let (api, output) = run_script(dir.path(), &script).await;

    assert_eq!(output.matches("Please enter a valid number.").count(), 1);
    assert_eq!(output.matches("Invalid option. Please try again.").count(), 2);
    assert!(output.contains("Username cannot be empty."));
    assert!(output.contains("invalid name: input cannot be empty"));
    assert!(output.contains("invalid email"));
    assert!(output.contains("invalid password: must be at least 8 characters"));
    assert!(output.contains("invalid asset type"));
    assert!(output.contains("invalid quantity: value must be positive"));
    assert!(output.contains("invalid quantity: please enter a valid number"));
    assert!(output.contains("invalid index: no asset at that position"));
    assert!(output.contains("Invalid choice. Operation cancelled."));
    assert!(output.contains("Asset removed!"));
    assert!(output.contains("You don't have any assets to calculate zakat for."));

    let (session, _) = api.login("alice", PASSWORD).unwrap();
    assert!(api.portfolio(&session).unwrap().holdings.is_empty());
}

#[tokio::test]
async fn taken_username_is_reprompted() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        "1\nalice\nbob\nBob\nbob@example.com\npassword456\n".to_string(),
    ]
    .concat();

    let (api, output) = run_script(dir.path(), &script).await;

    assert!(output.contains("Username already exists. Please choose another."));
    assert_eq!(api.state().users.len(), 2);
    assert_eq!(api.state().users.get("alice").unwrap().name, "Alice");
    assert!(api.login("bob", "password456").is_ok());
}

#[tokio::test]
async fn wrong_password_is_reported_generically() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        "2\nalice\nwrong-password\n".to_string(),
        "2\nghost\npassword123\n".to_string(),
    ]
    .concat();

    let (_, output) = run_script(dir.path(), &script).await;

    assert_eq!(output.matches("Invalid username or password.").count(), 2);
    assert!(!output.contains("Logged in as"));
}

#[tokio::test]
async fn bank_link_shows_masked_card_and_replaces_previous() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        login_lines("alice"),
        "5\nFirst Bank\n1234 5678 1234 5678\n12345\n123456\n".to_string(),
        "5\nSecond Bank\n12345\n8765432187654321\n000000\n".to_string(),
    ]
    .concat();

    let (api, output) = run_script(dir.path(), &script).await;

    assert!(output.contains("Verifying OTP with bank... (simulated)"));
    assert!(output.contains("invalid OTP: must be 6 digits"));
    assert!(output.contains("invalid card number: must be 16 digits"));
    assert!(output.contains("Bank account linked successfully! (First Bank ---4321)"));
    assert!(output.contains("Currently linked: First Bank ---4321 (will be replaced)"));
    assert!(output.contains("Bank account linked successfully! (Second Bank ---5678)"));

    let (session, _) = api.login("alice", PASSWORD).unwrap();
    assert_eq!(
        api.bank_account(&session).unwrap().unwrap().bank_name,
        "Second Bank"
    );
}

#[tokio::test]
async fn end_of_input_mid_prompt_still_saves() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        login_lines("alice"),
        "2\nREAL_ESTATE\n2\n".to_string(),
        "2\nGOLD\n".to_string(),
    ]
    .concat();

    let (_, output) = run_script(dir.path(), &script).await;
    assert!(output.ends_with("Thank you for using InvestWise!\n"));

    let saved = Db::new(dir.path()).load().await.unwrap();
    let holdings = saved.portfolios.list("alice");
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].asset.kind(), AssetKind::RealEstate);
    assert_eq!(saved.portfolios.total_value("alice"), dec!(500000));
}

#[tokio::test]
async fn quantities_are_shown_rounded_to_cents() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        login_lines("alice"),
        "2\nGOLD\n2.999\n".to_string(),
        "2\nSTOCK\n0.125\n".to_string(),
        "1\n".to_string(),
    ]
    .concat();

    let (_, output) = run_script(dir.path(), &script).await;

    assert!(output.contains("0: GOLD - Quantity: 3.00, Value: $5,398.20"));
    assert!(output.contains("1: STOCK - Quantity: 0.13, Value: $18.75"));
}

#[tokio::test]
async fn huge_quantity_is_rejected_without_changing_the_portfolio() {
    let dir = tempfile::tempdir().unwrap();
    let script = [
        sign_up_lines("alice"),
        login_lines("alice"),
        "2\nREAL_ESTATE\n79228162514264337593543950335\n".to_string(),
        "2\nGOLD\n1\n".to_string(),
        "1\n4\nN\n".to_string(),
    ]
    .concat();

    let (api, output) = run_script(dir.path(), &script).await;

    assert!(output.contains("invalid quantity: value is too large to track"));
    assert!(output.contains("Total Portfolio Value: $1,800.00"));
    assert!(output.contains("Zakat Due (2.5%): $45.00"));
    let (session, _) = api.login("alice", PASSWORD).unwrap();
    assert_eq!(api.portfolio(&session).unwrap().holdings.len(), 1);
}

#[tokio::test]
async fn interrupt_during_bank_verification_cancels_the_link() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_with_link_delay(dir.path(), Duration::from_secs(60)).await;
    let (interrupt_tx, interrupt_rx) = watch::channel(());
    let (mut console, mut terminal) = attach(api, interrupt_rx);

    let operator = async move {
        let script = [
            sign_up_lines("alice"),
            login_lines("alice"),
            "5\nFirst Bank\n1234567812345678\n123456\n".to_string(),
        ]
        .concat();
        terminal.type_text(&script).await;
        terminal.wait_for("Verifying OTP with bank... (simulated)").await;
        interrupt_tx.send(()).unwrap();
        terminal
            .wait_for("Bank verification cancelled. No account was linked.")
            .await;
        terminal.wait_for("Main Menu (Logged in as alice)").await;
        terminal.type_text("6\n3\n").await;
        terminal.wait_for("Logged out successfully.").await;
        terminal.wait_for("Thank you for using InvestWise!").await;
        terminal.transcript
    };
    let (result, transcript) = tokio::join!(console.run(), operator);
    result.unwrap();
    let (api, _) = console.into_parts();

    assert!(!transcript.contains("Bank account linked successfully!"));
    let (session, _) = api.login("alice", PASSWORD).unwrap();
    assert!(api.bank_account(&session).unwrap().is_none());

    let saved = Db::new(dir.path()).load().await.unwrap();
    assert_eq!(&saved, api.state());
    assert!(saved.bank_accounts.get("alice").is_none());
    assert!(saved.users.get("alice").is_some());
}

#[tokio::test]
async fn interrupt_at_a_prompt_saves_and_exits() {
    let dir = tempfile::tempdir().unwrap();
    let api = api_at(dir.path()).await;
    let (interrupt_tx, interrupt_rx) = watch::channel(());
    let (mut console, mut terminal) = attach(api, interrupt_rx);

    let operator = async move {
        let script = [
            sign_up_lines("alice"),
            login_lines("alice"),
            "2\nGOLD\n3\n".to_string(),
        ]
        .concat();
        terminal.type_text(&script).await;
        terminal.wait_for("Asset added to portfolio!").await;
        terminal.wait_for("Choose an option: ").await;
        interrupt_tx.send(()).unwrap();
        terminal.wait_for("Thank you for using InvestWise!").await;
        // The keyboard is still open here, so only the interrupt ended the session.
        terminal.transcript
    };
    let (result, transcript) = tokio::join!(console.run(), operator);
    result.unwrap();

    assert!(!transcript.contains("Invalid option"));
    let saved = Db::new(dir.path()).load().await.unwrap();
    let holdings = saved.portfolios.list("alice");
    assert_eq!(holdings.len(), 1);
    assert_eq!(holdings[0].asset.kind(), AssetKind::Gold);
    assert_eq!(holdings[0].asset.quantity(), dec!(3));
    assert_eq!(saved.portfolios.total_value("alice"), dec!(5400));
}
