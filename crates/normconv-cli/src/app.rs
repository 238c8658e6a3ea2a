//! Command handlers.
//!
//! `App` owns the loaded configuration, the session's persisted state and
//! the API client. Each command mutates the state and saves what it changed.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, warn};

use normconv_core::age::{format_age_result, AgeResult};
use normconv_core::api::{ApiClient, ApiError};
use normconv_core::auth::{AuthSession, CredentialStore};
use normconv_core::config::Config;
use normconv_core::convert::{self, SubmitError};
use normconv_core::error::ValidationError;
use normconv_core::models::{
    disabled_reason, is_tool_active, ChildInfo, Gender, SubtestInputPatch, ToolId,
};
use normconv_core::report::{format_session_report, format_tool_section};
use normconv_core::storage::{SessionState, SessionStore};

pub struct App {
    store: SessionStore,
    api: ApiClient,
    credentials: CredentialStore,
    auth: AuthSession,
    state: SessionState,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let base_url = config.api_base_url();
        debug!(base_url = %base_url, session = config.session_name(), "Config loaded");

        let store = SessionStore::new(config.session_dir()?)?;
        let state = match store.load_all() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Failed to load session, starting fresh");
                SessionState::default()
            }
        };

        let api = ApiClient::new(&base_url).context("Failed to create HTTP client")?;

        Ok(Self {
            store,
            api,
            credentials: CredentialStore::default(),
            auth: AuthSession::new(),
            state,
        })
    }

    fn age(&self) -> Option<AgeResult> {
        self.state.child.as_ref().and_then(|c| c.age().ok())
    }

    fn require_child(&self) -> Result<(&ChildInfo, AgeResult)> {
        let child = self
            .state
            .child
            .as_ref()
            .ok_or_else(|| anyhow!("No child information. Run `normconv child set` first"))?;
        Ok((child, child.age()?))
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, key: Option<String>) -> Result<()> {
        let key = match key {
            Some(key) => key,
            None => rpassword::prompt_password("API key: ")?,
        };

        println!("Verifying API key...");
        if let Err(e) = self.auth.verify(&self.api, &key).await {
            error!(error = %e, "API key verification failed");
            bail!(e.user_message());
        }

        if let Some(key) = self.auth.key() {
            if let Err(e) = self.credentials.store(key) {
                warn!(error = %e, "Failed to store API key");
            }
        }

        println!("API key verified.");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        self.auth.invalidate();
        self.credentials.delete()?;
        println!("API key removed.");
        Ok(())
    }

    /// Authenticate with the stored key. A key the service rejects is removed.
    async fn ensure_authenticated(&mut self) -> Result<ApiClient> {
        if !self.auth.is_authenticated() {
            let key = self
                .credentials
                .get()?
                .ok_or_else(|| anyhow!("No API key. Run `normconv login` first"))?;

            if let Err(e) = self.auth.verify(&self.api, &key).await {
                self.forget_rejected_key(&e);
                bail!(e.user_message());
            }
        }

        self.auth
            .authorized(&self.api)
            .ok_or_else(|| anyhow!("No API key. Run `normconv login` first"))
    }

    /// Drop the session key and the stored key if the service rejected it.
    fn forget_rejected_key(&mut self, err: &ApiError) {
        if !self.auth.observe(err) {
            return;
        }
        if let Err(e) = self.credentials.delete() {
            warn!(error = %e, "Failed to remove rejected API key");
        }
    }

    // =========================================================================
    // Child information
    // =========================================================================

    pub fn set_child(
        &mut self,
        name: &str,
        gender: Gender,
        birth: NaiveDate,
        test: Option<NaiveDate>,
    ) -> Result<()> {
        let test = test.unwrap_or_else(|| Local::now().date_naive());
        let child = ChildInfo::new(name, gender, birth, test)?;
        let age = child.age()?;

        self.state.child = Some(child);
        self.store.save_child_info(self.state.child.as_ref())?;
        info!(age_months = age.total_months, "Child information saved");

        println!("생활연령: {}", format_age_result(&age));
        self.warn_ineligible_selection(age.total_months);
        Ok(())
    }

    fn warn_ineligible_selection(&self, age_months: u32) {
        for tool in self.state.selection.selected() {
            if let Some(reason) = disabled_reason(*tool, Some(age_months)) {
                println!("주의: {} - {}", tool.name(), reason);
            }
        }
    }

    pub fn show_child(&self) -> Result<()> {
        let (child, age) = self.require_child()?;
        println!("이름: {}", child.name);
        println!("성별: {}", child.gender.label());
        println!("생년월일: {}", child.birth_date);
        println!("검사일: {}", child.test_date);
        println!("생활연령: {}", format_age_result(&age));
        Ok(())
    }

    pub fn clear_child(&mut self) -> Result<()> {
        self.state.child = None;
        self.store.save_child_info(None)?;
        println!("Child information cleared.");
        Ok(())
    }

    // =========================================================================
    // Tool selection
    // =========================================================================

    pub fn list_tools(&self) {
        let age = self.age().map(|a| a.total_months);
        for tool in ToolId::ALL {
            let meta = tool.metadata();
            let status = match disabled_reason(tool, age) {
                Some(reason) => reason.to_string(),
                None if self.state.selection.is_selected(tool) => "선택됨".to_string(),
                None => "선택 가능".to_string(),
            };
            println!(
                "{:<16} {:<10} {:<8} {:>3}-{:<3}개월  {}",
                tool.as_str(),
                meta.name,
                meta.category.label(),
                meta.min_age_months,
                meta.max_age_months,
                status
            );
        }
    }

    pub fn select(&mut self, tools: &[ToolId]) -> Result<()> {
        let age = self.require_child()?.1.total_months;

        let mut rejected = Vec::new();
        for tool in tools {
            if let Some(reason) = disabled_reason(*tool, Some(age)) {
                rejected.push(format!("{}: {}", tool.name(), reason));
                continue;
            }
            if self.state.selection.add(*tool) {
                self.state.scores.init_default(*tool);
                println!("{} 선택됨", tool.name());
            }
        }

        self.save_selection_and_scores()?;
        if !rejected.is_empty() {
            bail!("선택할 수 없는 검사도구: {}", rejected.join(", "));
        }
        Ok(())
    }

    pub fn deselect(&mut self, tool: ToolId) -> Result<()> {
        if !self.state.selection.remove(tool) {
            bail!("{} is not selected", tool.name());
        }
        self.state.scores.retain_tools(self.state.selection.selected());
        self.save_selection_and_scores()?;
        println!("{} 선택 해제됨", tool.name());
        Ok(())
    }

    // =========================================================================
    // Score entry
    // =========================================================================

    pub fn score(
        &mut self,
        tool: ToolId,
        subtest: &str,
        raw: Option<&str>,
        correct: Option<String>,
        wrong: Option<String>,
        example: Option<String>,
    ) -> Result<()> {
        if !self.state.selection.is_selected(tool) {
            bail!("{} is not selected. Run `normconv select {}` first", tool.name(), tool);
        }
        if !tool.input_subtests().iter().any(|s| *s == subtest) {
            return Err(ValidationError::UnknownSubtest {
                tool,
                subtest: subtest.to_string(),
            }
            .into());
        }

        let scores = &mut self.state.scores;
        scores.init_default(tool);

        if let Some(items) = correct {
            scores.set_input(tool, subtest, SubtestInputPatch::correct_items(items));
        }
        if let Some(items) = wrong {
            scores.set_input(tool, subtest, SubtestInputPatch::wrong_items(items));
        }
        if let Some(items) = example {
            scores.set_input(tool, subtest, SubtestInputPatch::example_items(items));
        }
        if let Err(e) = scores.validate_items(tool, subtest) {
            println!("주의: {}", e);
        }

        let entered = match raw {
            None => Ok(()),
            Some(raw) => {
                let value = parse_raw_score(raw)?;
                scores.enter_score(tool, subtest, value)
            }
        };

        // An out-of-range score is stored as cleared, so save either way.
        self.store.save_scores(&self.state.scores)?;
        entered?;

        if let Some(total) = self.state.scores.total_score(tool) {
            println!("{} 총점: {}", tool.name(), total);
        }
        Ok(())
    }

    pub fn status(&self) {
        match (&self.state.child, self.age()) {
            (Some(child), Some(age)) => {
                println!(
                    "아동: {} ({}) {}",
                    child.name,
                    child.gender.label(),
                    format_age_result(&age)
                )
            }
            _ => println!("아동: 미입력"),
        }

        if self.state.selection.is_empty() {
            println!("선택된 검사도구 없음");
            return;
        }

        for tool in self.state.selection.selected() {
            let state = if !is_tool_active(*tool) {
                "준비 중"
            } else if self.state.scores.result(*tool).is_some() {
                "결과 있음"
            } else if self.state.scores.is_tool_complete(*tool) {
                "입력 완료"
            } else {
                "입력 필요"
            };
            println!("\n■ {} [{}]", tool.name(), state);

            for subtest in tool.input_subtests() {
                let input = self.state.scores.input(*tool, subtest);
                let raw = input
                    .and_then(|i| i.raw_score)
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let bounds = tool
                    .score_bounds(subtest)
                    .map(|b| format!(" ({})", b))
                    .unwrap_or_default();
                println!("  {}: {}{}", ToolId::subtest_label(subtest), raw, bounds);
            }
        }

        if let Some(ref summary) = self.state.scores.integrated_summary {
            println!("\n통합 요약: {}", summary);
        }
    }

    // =========================================================================
    // Conversion
    // =========================================================================

    pub async fn submit(&mut self) -> Result<()> {
        // Fail on local problems before touching the network or keychain.
        let (child, age) = self.require_child()?;
        convert::build_request(child, &age, &self.state.selection, &self.state.scores)
            .map_err(submit_error)?;

        let client = self.ensure_authenticated().await?;

        println!("결과를 요청하는 중...");
        let result = convert::submit(
            &client,
            self.state.child.as_ref(),
            &self.state.selection,
            &mut self.state.scores,
        )
        .await;

        if let Err(e) = result {
            if let SubmitError::Api(ref api) = e {
                self.forget_rejected_key(api);
            }
            error!(error = %e, "Conversion failed");
            return Err(submit_error(e));
        }

        self.store.save_scores(&self.state.scores)?;
        self.report(None, None)
    }

    pub fn report(&self, tool: Option<ToolId>, output: Option<&Path>) -> Result<()> {
        let (child, age) = self.require_child()?;

        let text = match tool {
            Some(tool) => {
                let result = self
                    .state
                    .scores
                    .result(tool)
                    .ok_or_else(|| {
                        anyhow!("No {} result yet. Run `normconv submit` first", tool.name())
                    })?;
                format_tool_section(tool, result)
            }
            None => {
                if !self.state.scores.has_results() {
                    bail!("No results yet. Run `normconv submit` first");
                }
                format_session_report(child, &age, &self.state.scores)
            }
        };

        match output {
            Some(path) => {
                std::fs::write(path, format!("{}\n", text))
                    .with_context(|| format!("Failed to write report: {}", path.display()))?;
                eprintln!("Report written to {}", path.display());
            }
            None => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", text)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub fn change_tools(&mut self) -> Result<()> {
        self.state.scores.clear_all();
        self.state.selection.clear();
        self.save_selection_and_scores()?;
        println!("Scores and selection cleared. Select tools again with `normconv select`.");
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.state = SessionState::default();
        self.store.clear_all()?;
        println!("Session reset.");
        Ok(())
    }

    fn save_selection_and_scores(&self) -> Result<()> {
        self.store.save_selection(&self.state.selection)?;
        self.store.save_scores(&self.state.scores)
    }
}

fn submit_error(e: SubmitError) -> anyhow::Error {
    match e {
        SubmitError::Api(api) => anyhow!(api.user_message()),
        other => anyhow!(other),
    }
}

/// Parse a raw score argument. "-" or an empty string clears the score.
fn parse_raw_score(raw: &str) -> Result<Option<i64>> {
    let raw = raw.trim();
    if raw.is_empty() || raw == "-" {
        return Ok(None);
    }
    raw.parse::<i64>()
        .map(Some)
        .with_context(|| format!("Invalid raw score: {}", raw))
}
