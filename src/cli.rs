// src/cli.rs
use crate::api::{Api, PortfolioView};
use crate::error::{AppError, Result as AppResult};
use crate::models::Session;
use crate::validation;
use log::debug;
use rust_decimal::{Decimal, RoundingStrategy};
use std::future;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::watch;

enum Flow {
    Continue,
    Exit,
}

/// Resolves when an interrupt is signalled. Never resolves once every sender is gone.
async fn interrupted(interrupts: &mut watch::Receiver<()>) {
    if interrupts.changed().await.is_err() {
        future::pending::<()>().await;
    }
}

/// `$#,##0.00`, rounding half to even.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    format!("{}${}.{}", sign, grouped, fraction)
}

/// Interactive menu loop. Input ends, Exit, and an interrupt at a prompt all
/// save every store before `run` returns.
pub struct Console<R, W> {
    api: Api,
    input: R,
    output: W,
    interrupts: watch::Receiver<()>,
    session: Option<Session>,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(api: Api, input: R, output: W, interrupts: watch::Receiver<()>) -> Self {
        Console {
            api,
            input,
            output,
            interrupts,
            session: None,
        }
    }

    pub fn into_parts(self) -> (Api, W) {
        (self.api, self.output)
    }

    pub async fn run(&mut self) -> io::Result<()> {
        self.say("=== InvestWise App ===").await?;
        loop {
            let flow = match self.session.clone() {
                None => self.unauthenticated_menu().await?,
                Some(session) => self.authenticated_menu(&session).await?,
            };
            if let Flow::Exit = flow {
                break;
            }
        }
        if let Err(e) = self.api.shutdown().await {
            self.say(&format!("Error saving data: {}", e)).await?;
        }
        self.say("Thank you for using InvestWise!").await
    }

    async fn unauthenticated_menu(&mut self) -> io::Result<Flow> {
        self.say("\nMain Menu (Not Logged In)").await?;
        self.say("1. Sign Up\n2. Login\n3. Exit").await?;
        let Some(choice) = self.prompt("Choose an option: ").await? else {
            return Ok(Flow::Exit);
        };
        match choice.trim().parse::<i32>() {
            Ok(1) => self.sign_up().await,
            Ok(2) => self.login().await,
            Ok(3) => Ok(Flow::Exit),
            Ok(_) => self.invalid_option().await,
            Err(_) => self.not_a_number().await,
        }
    }

    async fn authenticated_menu(&mut self, session: &Session) -> io::Result<Flow> {
        self.say(&format!("\nMain Menu (Logged in as {})", session.username))
            .await?;
        self.say(
            "1. View Portfolio\n2. Add Asset\n3. Edit/Remove Asset\n\
             4. Calculate Zakat\n5. Connect Bank Account\n6. Logout",
        )
        .await?;
        let Some(choice) = self.prompt("Choose an option: ").await? else {
            return Ok(Flow::Exit);
        };
        match choice.trim().parse::<i32>() {
            Ok(1) => self.view_portfolio(session).await,
            Ok(2) => self.add_asset(session).await,
            Ok(3) => self.edit_or_remove_asset(session).await,
            Ok(4) => self.zakat(session).await,
            Ok(5) => self.connect_bank(session).await,
            Ok(6) => {
                self.session = None;
                self.say("Logged out successfully.").await?;
                Ok(Flow::Continue)
            }
            Ok(_) => self.invalid_option().await,
            Err(_) => self.not_a_number().await,
        }
    }

    async fn sign_up(&mut self) -> io::Result<Flow> {
        self.say("\n--- Sign Up ---").await?;
        let username = loop {
            let Some(input) = self.prompt("Enter username: ").await? else {
                return Ok(Flow::Exit);
            };
            match validation::username(&input) {
                Ok(username) if self.api.username_available(&username) => break username,
                Ok(_) => {
                    self.say("Username already exists. Please choose another.")
                        .await?
                }
                Err(_) => self.say("Username cannot be empty.").await?,
            }
        };
        let Some(name) = self
            .ask("Enter name: ", |s| validation::non_empty("name", s))
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(email) = self.ask("Enter email: ", validation::email).await? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self
            .ask("Enter password (min 8 chars): ", validation::password)
            .await?
        else {
            return Ok(Flow::Exit);
        };

        match self.api.sign_up(&username, &name, &email, &password).await {
            Ok(_) => self.say("Sign-up successful! You can now login.").await?,
            Err(e) => self.report(e).await?,
        }
        Ok(Flow::Continue)
    }

    async fn login(&mut self) -> io::Result<Flow> {
        self.say("\n--- Login ---").await?;
        let Some(username) = self.prompt("Enter username: ").await? else {
            return Ok(Flow::Exit);
        };
        let Some(password) = self.prompt("Enter password: ").await? else {
            return Ok(Flow::Exit);
        };
        match self.api.login(&username, password.trim()) {
            Ok((session, user)) => {
                self.session = Some(session);
                self.say(&format!("Login successful! Welcome, {}.", user.name))
                    .await?;
            }
            Err(AppError::AuthFailure) => self.say("Invalid username or password.").await?,
            Err(e) => self.report(e).await?,
        }
        Ok(Flow::Continue)
    }

    async fn view_portfolio(&mut self, session: &Session) -> io::Result<Flow> {
        self.say("\n--- Your Portfolio ---").await?;
        match self.api.portfolio(session) {
            Ok(view) => self.print_portfolio(&view).await?,
            Err(e) => self.report(e).await?,
        }
        Ok(Flow::Continue)
    }

    async fn print_portfolio(&mut self, view: &PortfolioView) -> io::Result<()> {
        if view.holdings.is_empty() {
            return self.say("You don't have any assets yet.").await;
        }
        self.say("Your assets:").await?;
        for holding in &view.holdings {
            self.say(&format!(
                "{}: {} - Quantity: {:.2}, Value: {}",
                holding.index,
                holding.asset.kind(),
                holding
                    .asset
                    .quantity()
                    .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                format_currency(holding.value)
            ))
            .await?;
        }
        self.say(&format!(
            "\nTotal Portfolio Value: {}",
            format_currency(view.total_value)
        ))
        .await
    }

    async fn add_asset(&mut self, session: &Session) -> io::Result<Flow> {
        self.say("\n--- Add Asset ---").await?;
        let Some(kind) = self
            .ask(
                "Enter asset type (STOCK/REAL_ESTATE/CRYPTO/GOLD): ",
                validation::asset_kind,
            )
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(quantity) = self
            .ask("Enter quantity: ", validation::positive_quantity)
            .await?
        else {
            return Ok(Flow::Exit);
        };
        match self.api.add_asset(session, kind, quantity).await {
            Ok(()) => self.say("Asset added to portfolio!").await?,
            Err(e) => self.report(e).await?,
        }
        Ok(Flow::Continue)
    }

    async fn edit_or_remove_asset(&mut self, session: &Session) -> io::Result<Flow> {
        self.say("\n--- Edit/Remove Asset ---").await?;
        let view = match self.api.portfolio(session) {
            Ok(view) => view,
            Err(e) => {
                self.report(e).await?;
                return Ok(Flow::Continue);
            }
        };
        if view.holdings.is_empty() {
            self.say("You don't have any assets to edit.").await?;
            return Ok(Flow::Continue);
        }
        self.print_portfolio(&view).await?;

        let len = view.holdings.len();
        let Some(choice) = self
            .ask(
                "Enter asset index to edit/remove (or -1 to cancel): ",
                |s| validation::asset_index(s, len),
            )
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(index) = choice else {
            return Ok(Flow::Continue);
        };

        let Some(action) = self.prompt("Edit (E) or Remove (R)? ").await? else {
            return Ok(Flow::Exit);
        };
        match action.trim().to_ascii_uppercase().as_str() {
            "E" => {
                let Some(quantity) = self
                    .ask("Enter new quantity: ", validation::positive_quantity)
                    .await?
                else {
                    return Ok(Flow::Exit);
                };
                match self.api.edit_asset(session, index, quantity).await {
                    Ok(()) => self.say("Asset updated!").await?,
                    Err(e) => self.report(e).await?,
                }
            }
            "R" => match self.api.remove_asset(session, index).await {
                Ok(_) => self.say("Asset removed!").await?,
                Err(e) => self.report(e).await?,
            },
            _ => self.say("Invalid choice. Operation cancelled.").await?,
        }
        Ok(Flow::Continue)
    }

    async fn zakat(&mut self, session: &Session) -> io::Result<Flow> {
        self.say("\n--- Zakat Calculation ---").await?;
        let report = match self.api.zakat_report(session) {
            Ok(Some(report)) => report,
            Ok(None) => {
                self.say("You don't have any assets to calculate zakat for.")
                    .await?;
                return Ok(Flow::Continue);
            }
            Err(e) => {
                self.report(e).await?;
                return Ok(Flow::Continue);
            }
        };

        self.say("Asset Summary:").await?;
        for line in &report.lines {
            self.say(&format!("- {}: {}", line.kind, format_currency(line.value)))
                .await?;
        }
        self.say(&format!(
            "\nTotal Value: {}",
            format_currency(report.total_value)
        ))
        .await?;
        self.say(&format!(
            "Zakat Due (2.5%): {}",
            format_currency(report.zakat_due)
        ))
        .await?;

        let Some(answer) = self.prompt("Generate PDF report? (Y/N): ").await? else {
            return Ok(Flow::Exit);
        };
        if answer.trim().eq_ignore_ascii_case("y") {
            self.say("PDF report generated (simulated)!").await?;
        }
        Ok(Flow::Continue)
    }

    async fn connect_bank(&mut self, session: &Session) -> io::Result<Flow> {
        self.say("\n--- Connect Bank Account ---").await?;
        match self.api.bank_account(session) {
            Ok(Some(current)) => {
                self.say(&format!(
                    "Currently linked: {} {} (will be replaced)",
                    current.bank_name,
                    current.masked_card_number()
                ))
                .await?
            }
            Ok(None) => {}
            Err(e) => {
                self.report(e).await?;
                return Ok(Flow::Continue);
            }
        }

        let Some(bank_name) = self
            .ask("Enter bank name: ", |s| validation::non_empty("bank name", s))
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(card_number) = self
            .ask("Enter card number (16 digits): ", validation::card_number)
            .await?
        else {
            return Ok(Flow::Exit);
        };
        let Some(otp) = self.ask("Enter OTP (6 digits): ", validation::otp).await? else {
            return Ok(Flow::Exit);
        };

        self.say("Verifying OTP with bank... (simulated)").await?;
        let result = self
            .api
            .connect_bank(
                session,
                &bank_name,
                &card_number,
                &otp,
                interrupted(&mut self.interrupts),
            )
            .await;
        match result {
            Ok(account) => {
                self.say(&format!(
                    "Bank account linked successfully! ({} {})",
                    account.bank_name,
                    account.masked_card_number()
                ))
                .await?
            }
            Err(AppError::Cancelled) => {
                self.say("Bank verification cancelled. No account was linked.")
                    .await?
            }
            Err(e) => self.report(e).await?,
        }
        Ok(Flow::Continue)
    }

    async fn invalid_option(&mut self) -> io::Result<Flow> {
        self.say("Invalid option. Please try again.").await?;
        Ok(Flow::Continue)
    }

    async fn not_a_number(&mut self) -> io::Result<Flow> {
        self.say("Please enter a valid number.").await?;
        Ok(Flow::Continue)
    }

    async fn report(&mut self, e: AppError) -> io::Result<()> {
        if matches!(e, AppError::AuthFailure) {
            self.session = None;
            return self
                .say("Your session has expired. Please log in again.")
                .await;
        }
        if e.is_persistence() {
            return self
                .say(&format!(
                    "Warning: the change is kept in memory but could not be saved: {}",
                    e
                ))
                .await;
        }
        self.say(&e.to_string()).await
    }

    /// Re-prompts until `parse` accepts the input. `None` means the console should stop.
    async fn ask<T, F>(&mut self, text: &str, parse: F) -> io::Result<Option<T>>
    where
        F: Fn(&str) -> AppResult<T>,
    {
        loop {
            let Some(input) = self.prompt(text).await? else {
                return Ok(None);
            };
            match parse(&input) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => self.say(&e.to_string()).await?,
            }
        }
    }

    /// `None` on end of input or an interrupt.
    async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        let read = tokio::select! {
            read = self.input.read_line(&mut line) => Some(read?),
            _ = interrupted(&mut self.interrupts) => None,
        };
        match read {
            Some(0) => {}
            Some(_) => return Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string())),
            None => debug!("Interrupted at prompt"),
        }
        self.say("").await?;
        Ok(None)
    }

    async fn say(&mut self, text: &str) -> io::Result<()> {
        self.output.write_all(text.as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }
}
