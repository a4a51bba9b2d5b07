//! Interactive investigator shell.
//!
//! Rustyline loop that dispatches command verbs to the agent or the
//! telemetry client; any other non-empty input becomes a conversational
//! turn. Every failure renders as a one-line message and the loop
//! continues.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use crossterm::style::{Color, ResetColor, SetForegroundColor};
use crossterm::ExecutableCommand;
use rustyline::error::ReadlineError;
use rustyline::history::FileHistory;
use rustyline::{Config, Editor};

use aii_agent::InvestigatorAgent;
use aii_core::{SettingsStore, TelemetryClient};
use aii_telemetry::format_verbose;

pub struct Shell {
    store: Arc<SettingsStore>,
    telemetry: Arc<dyn TelemetryClient>,
    agent: InvestigatorAgent,
    editor: Editor<(), FileHistory>,
    history_path: Option<PathBuf>,
}

impl Shell {
    pub fn new(
        store: Arc<SettingsStore>,
        telemetry: Arc<dyn TelemetryClient>,
        agent: InvestigatorAgent,
    ) -> Result<Self> {
        let config = Config::builder()
            .history_ignore_space(true)
            .history_ignore_dups(true)?
            .build();
        let mut editor: Editor<(), FileHistory> = Editor::with_config(config)?;

        let history_path = dirs::config_dir().map(|d| d.join("aii").join("shell_history"));
        if let Some(ref path) = history_path {
            let _ = editor.load_history(path);
        }

        Ok(Self {
            store,
            telemetry,
            agent,
            editor,
            history_path,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.print_header();
        self.ensure_authentication()?;
        self.prompt_for_app_id()?;
        self.offer_session_restore().await?;
        self.print_help();

        loop {
            self.print_status_strip();

            let line = match self.editor.readline("> ") {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(&line);
                    line
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(e) => {
                    self.print_error(&format!("Error reading input: {}", e));
                    continue;
                }
            };

            match self.handle_command(&line).await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => self.print_error(&e.to_string()),
            }
        }

        println!("\nGoodbye!");
        if let Some(ref path) = self.history_path {
            let _ = self.editor.save_history(path);
        }
        Ok(())
    }

    /// Dispatch one line of input. Returns false when the shell should exit.
    async fn handle_command(&mut self, input: &str) -> Result<bool> {
        let (command, args) = parse_command(input);

        match command.as_str() {
            "" => {}

            "appinsight" | "ai" => {
                if args.is_empty() {
                    println!("\nUsage: appinsight <app-id>");
                    println!("Example: appinsight 12345678-abcd-efgh-ijkl-mnopqrstuvwx");
                } else {
                    self.store.set_current_app_id(&args)?;
                    println!("\nApp Insights application set: {}", args);
                }
            }

            "session" | "s" => {
                if args.is_empty() {
                    println!("\nUsage: session <session-id>");
                    println!("Example: session +BEDYlOz6f/KD/zyH1SUql");
                } else {
                    println!("\nLoading session {}...", args);
                    match self.agent.set_session(&args).await {
                        Ok(load) => {
                            self.store.set_last_session_id(&args)?;
                            println!("Session loaded with {} event(s).", load.event_count);
                        }
                        Err(e) => println!("Failed to load session: {}", e),
                    }
                }
            }

            "investigate" | "inv" => {
                let complaint = if args.is_empty() {
                    match self.prompt_line("Enter user complaint: ")? {
                        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
                        _ => {
                            println!("Please enter a complaint.");
                            return Ok(true);
                        }
                    }
                } else {
                    args
                };

                println!("\nInvestigating...\n");
                match self.agent.investigate(&complaint).await {
                    Ok(response) => println!("{}", response),
                    Err(e) => println!("Error during investigation: {}", e),
                }
            }

            "query" | "q" => {
                if args.is_empty() {
                    println!("\nUsage: query <kql-query>");
                    println!("Example: query customEvents | take 10");
                } else {
                    println!("\nExecuting query...\n");
                    match self.telemetry.run_query(&args).await {
                        Ok(result) => println!("{}", format_verbose(&result)),
                        Err(e) => println!("Query failed: {}", e),
                    }
                }
            }

            "config" => self.handle_config(&args)?,

            "status" | "st" => self.print_config_status(),

            "clear" | "c" => {
                self.agent.clear_context();
                println!("\nConversation context cleared.");
            }

            "help" | "h" | "?" => self.print_help(),

            "quit" | "exit" => return Ok(false),

            _ => {
                // Not a command; route to the agent as a conversational turn.
                println!("\nThinking...\n");
                match self.agent.chat(input.trim()).await {
                    Ok(response) => println!("{}", response),
                    Err(e) => println!("Error: {}", e),
                }
            }
        }

        Ok(true)
    }

    fn handle_config(&mut self, args: &str) -> Result<()> {
        let mut parts = args.splitn(2, ' ');
        let setting = parts.next().unwrap_or("").to_lowercase();
        let value = parts.next().unwrap_or("").trim().to_string();

        if setting.is_empty() {
            println!("\nUsage: config <setting> <value>");
            println!("Settings: api-key, llm-key, llm-url, llm-model");
            return Ok(());
        }
        if value.is_empty() {
            println!("\nUsage: config {} <value>", setting);
            return Ok(());
        }

        match setting.as_str() {
            "api-key" => {
                self.store.set_app_insights_api_key(&value)?;
                println!("\nApp Insights API key configured.");
            }
            "llm-key" => {
                self.store.set_llm_api_key(&value)?;
                println!("\nLLM API key configured.");
            }
            "llm-url" => {
                self.store.set_llm_base_url(&value)?;
                println!("\nLLM base URL set to: {}", value);
            }
            "llm-model" => {
                self.store.set_llm_model(&value)?;
                println!("\nLLM model set to: {}", value);
            }
            _ => {
                println!("\nUnknown setting: {}", setting);
                println!("Available: api-key, llm-key, llm-url, llm-model");
            }
        }
        Ok(())
    }

    fn ensure_authentication(&mut self) -> Result<()> {
        if !self.store.has_app_insights_api_key() {
            println!("App Insights API key not configured.");
            if let Some(key) = self.prompt_nonempty("Enter your App Insights API key: ")? {
                self.store.set_app_insights_api_key(key)?;
                println!("App Insights API key saved.\n");
            }
        }

        if !self.store.has_llm_api_key() {
            println!("LLM API key not configured.");
            if let Some(key) = self.prompt_nonempty("Enter your LLM API key (OpenAI or compatible): ")? {
                self.store.set_llm_api_key(key)?;
                println!("LLM API key saved.\n");
            }
        }

        Ok(())
    }

    fn prompt_for_app_id(&mut self) -> Result<()> {
        let current = self.store.snapshot().current_app_id;
        if !current.is_empty() {
            let msg = format!("Use previous App Insights ID ({})? [Y/n] ", current);
            if self.confirm(&msg, true)? {
                println!("\nUsing App Insights: {}", current);
                return Ok(());
            }
        }

        if let Some(app_id) = self.prompt_nonempty("Enter App Insights Application ID: ")? {
            self.store.set_current_app_id(&app_id)?;
            println!("\nUsing App Insights: {}", app_id);
        }
        Ok(())
    }

    async fn offer_session_restore(&mut self) -> Result<()> {
        let last = self.store.snapshot().last_session_id;
        if last.is_empty() {
            return Ok(());
        }

        let msg = format!("Restore previous session ({})? [y/N] ", truncate(&last, 20));
        if self.confirm(&msg, false)? {
            println!("\nLoading session...");
            match self.agent.set_session(&last).await {
                Ok(load) => println!("Session loaded with {} event(s).", load.event_count),
                Err(e) => println!("Failed to load session: {}", e),
            }
        }
        Ok(())
    }

    fn prompt_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("Error reading input: {}", e)),
        }
    }

    fn prompt_nonempty(&mut self, prompt: &str) -> Result<Option<String>> {
        loop {
            match self.prompt_line(prompt)? {
                Some(line) if !line.trim().is_empty() => return Ok(Some(line.trim().to_string())),
                Some(_) => println!("A value is required."),
                None => return Ok(None),
            }
        }
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        match self.prompt_line(prompt)? {
            Some(line) => {
                let answer = line.trim().to_lowercase();
                if answer.is_empty() {
                    Ok(default)
                } else {
                    Ok(answer.starts_with('y'))
                }
            }
            None => Ok(default),
        }
    }

    fn print_header(&self) {
        println!("\n{}", "═".repeat(60));
        println!("  App Insight Investigator - LLM-Powered Telemetry Analysis");
        println!("{}\n", "═".repeat(60));
    }

    fn print_help(&self) {
        println!(
            "
Available Commands:
  appinsight <id>, ai <id>  - Set App Insights application ID
  session <id>, s <id>      - Load session for investigation
  investigate <text>, inv   - Start investigation with complaint
  query <kql>, q <kql>      - Execute custom KQL query
  config api-key <key>      - Set App Insights API key
  config llm-key <key>      - Set LLM API key
  config llm-url <url>      - Set LLM base URL (default: OpenAI)
  config llm-model <model>  - Set LLM model
  status, st                - Show current configuration
  clear, c                  - Clear conversation context
  help, h, ?                - Show this help
  quit, exit                - Exit the application

For conversational queries, just type your message.
"
        );
    }

    /// One-line strip ahead of each prompt: app, session, event count.
    fn print_status_strip(&self) {
        let settings = self.store.snapshot();

        let mut status = String::from("\n");
        if settings.current_app_id.is_empty() {
            status.push_str("[App: not set]");
        } else {
            status.push_str(&format!("[App: {}]", truncate(&settings.current_app_id, 15)));
        }

        if let Some(session_id) = self.agent.current_session_id() {
            status.push_str(&format!(" [Session: {}]", truncate(session_id, 12)));
            status.push_str(&format!(" [Events: {}]", self.agent.event_count()));
        }

        let mut stdout = std::io::stdout();
        let _ = stdout.execute(SetForegroundColor(Color::DarkGrey));
        println!("{}", status);
        let _ = stdout.execute(ResetColor);
    }

    fn print_config_status(&self) {
        let settings = self.store.snapshot();
        let configured = |v: &str| if v.is_empty() { "[not set]" } else { "[configured]" };

        println!("\nConfiguration Status:");
        println!("{}", "─".repeat(50));
        println!("  App Insights API Key: {}", configured(&settings.app_insights_api_key));
        println!("  LLM API Key:      {}", configured(&settings.llm_api_key));
        println!("  LLM Base URL:     {}", settings.llm_base_url);
        println!("  LLM Model:        {}", settings.llm_model);
        println!(
            "  Current App ID:   {}",
            if settings.current_app_id.is_empty() {
                "[not set]"
            } else {
                &settings.current_app_id
            }
        );
        println!(
            "  Active Session:   {}",
            self.agent.current_session_id().unwrap_or("[none]")
        );
        println!("{}", "─".repeat(50));
    }

    fn print_error(&self, msg: &str) {
        let mut stdout = std::io::stdout();
        let _ = stdout.execute(SetForegroundColor(Color::Red));
        eprintln!("\nError: {}", msg);
        let _ = stdout.execute(ResetColor);
    }
}

/// Split input into a lower-cased command verb and its argument string.
fn parse_command(input: &str) -> (String, String) {
    let trimmed = input.trim();
    match trimmed.split_once(' ') {
        Some((verb, args)) => (verb.to_lowercase(), args.trim().to_string()),
        None => (trimmed.to_lowercase(), String::new()),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_splits_verb_and_args() {
        let (cmd, args) = parse_command("session abc123");
        assert_eq!(cmd, "session");
        assert_eq!(args, "abc123");
    }

    #[test]
    fn test_parse_command_lowercases_verb_only() {
        let (cmd, args) = parse_command("Query customEvents | take 10");
        assert_eq!(cmd, "query");
        assert_eq!(args, "customEvents | take 10");
    }

    #[test]
    fn test_parse_command_empty() {
        let (cmd, args) = parse_command("   ");
        assert_eq!(cmd, "");
        assert_eq!(args, "");
    }

    #[test]
    fn test_parse_command_no_args() {
        let (cmd, args) = parse_command("status");
        assert_eq!(cmd, "status");
        assert!(args.is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 15), "short");
        assert_eq!(truncate("abcdefghijklmnopqrst", 12), "abcdefghijkl...");
    }
}
