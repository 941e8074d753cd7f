// GitLab project summary panel

use anyhow::{Context, Result, bail};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Mutex;
use std::time::Duration;

use crate::engine::widget::{PanelKey, Widget, WidgetBase};
use crate::widgets::open_url;

const TOKEN_ENV: &str = "GITLAB_TOKEN";
const LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, Deserialize)]
struct User {
    id: u64,
    username: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteProject {
    path_with_namespace: String,
    #[serde(default)]
    web_url: String,
    #[serde(default)]
    open_issues_count: u64,
    #[serde(default)]
    star_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct MergeRequest {
    iid: u64,
    title: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Issue {
    iid: u64,
    title: String,
}

#[derive(Debug, Clone)]
struct ProjectSummary {
    remote: RemoteProject,
    open_merge_requests: usize,
    assigned_merge_requests: Vec<MergeRequest>,
    authored_merge_requests: Vec<MergeRequest>,
    assigned_issues: Vec<Issue>,
    authored_issues: Vec<Issue>,
}

pub struct GitlabWidget {
    base: WidgetBase,
    client: Client,
    api_url: String,
    api_key: Option<String>,
    projects: Vec<String>,
    open_url_util: Vec<String>,
    user: Mutex<Option<User>>,
    /// Project pages from the last refresh, in configured order
    web_urls: Mutex<Vec<String>>,
}

impl GitlabWidget {
    pub fn new(
        base: WidgetBase,
        domain: String,
        api_key: Option<String>,
        projects: Vec<String>,
        open_url_util: Vec<String>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        let api_key = api_key
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(TOKEN_ENV).ok());

        Ok(Self {
            base,
            client,
            api_url: format!("{}/api/v4", domain.trim_end_matches('/')),
            api_key,
            projects,
            open_url_util,
            user: Mutex::new(None),
            web_urls: Mutex::new(Vec::new()),
        })
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let Some(token) = &self.api_key else {
            bail!("no API key; set api_key or {}", TOKEN_ENV);
        };
        // A stopped panel skips its remaining requests
        if self.base.stop_signal().is_stopped() {
            bail!("stopped");
        }

        let url = format!("{}{}", self.api_url, path);
        let response = self
            .client
            .get(&url)
            .header("PRIVATE-TOKEN", token)
            .query(query)
            .send()
            .with_context(|| format!("GET {} failed", path))?;

        let status = response.status();
        if !status.is_success() {
            bail!("GET {} returned {}", path, status);
        }

        response
            .json()
            .with_context(|| format!("Unexpected response from {}", path))
    }

    fn current_user(&self) -> Result<User> {
        let mut cached = self.user.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(user) = cached.as_ref() {
            return Ok(user.clone());
        }
        let user: User = self.get("/user", &[])?;
        *cached = Some(user.clone());
        Ok(user)
    }

    fn load_project(&self, path: &str, user: &User) -> Result<ProjectSummary> {
        let base = format!("/projects/{}", encode_project_path(path));
        let opened = || ("state", "opened".to_string());
        let assignee = || ("assignee_id", user.id.to_string());
        let author = || ("author_id", user.id.to_string());

        let remote: RemoteProject = self.get(&base, &[])?;
        let mr_path = format!("{}/merge_requests", base);
        let issue_path = format!("{}/issues", base);

        let all_mrs: Vec<MergeRequest> = self.get(&mr_path, &[opened()])?;

        Ok(ProjectSummary {
            remote,
            open_merge_requests: all_mrs.len(),
            assigned_merge_requests: self.get(&mr_path, &[opened(), assignee()])?,
            authored_merge_requests: self.get(&mr_path, &[opened(), author()])?,
            assigned_issues: self.get(&issue_path, &[opened(), assignee()])?,
            authored_issues: self.get(&issue_path, &[opened(), author()])?,
        })
    }

    fn fetch(&self) -> Result<Vec<String>> {
        if self.projects.is_empty() {
            bail!("no projects configured");
        }

        let user = self.current_user()?;
        let mut lines = vec![format!("@{}", user.username)];
        let mut web_urls = Vec::with_capacity(self.projects.len());

        for path in &self.projects {
            // One broken project should not hide the others
            match self.load_project(path, &user) {
                Ok(summary) => {
                    web_urls.push(summary.remote.web_url.clone());
                    lines.extend(render_summary(&summary));
                }
                Err(e) => {
                    tracing::warn!(project = %path, "gitlab project failed: {:#}", e);
                    web_urls.push(String::new());
                    lines.push(format!("{}: {:#}", path, e));
                }
            }
        }

        *self.web_urls.lock().unwrap_or_else(|e| e.into_inner()) = web_urls;
        Ok(lines)
    }

    /// Open the page of the project at `index` in configured order.
    fn open_project(&self, index: usize) -> bool {
        let url = self
            .web_urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(index)
            .cloned()
            .unwrap_or_default();
        if url.is_empty() {
            return false;
        }
        if let Err(e) = open_url(&self.open_url_util, &url) {
            self.base.display_error(format!("{:#}", e));
        }
        true
    }
}

impl Widget for GitlabWidget {
    fn base(&self) -> &WidgetBase {
        &self.base
    }

    fn refresh(&self) {
        let result = self.fetch();
        if !self.base.stop_signal().is_stopped() {
            self.base.publish(result);
        }
    }

    /// `o` opens the first project, `1`..`9` open the nth.
    fn handle_key(&self, key: PanelKey) -> bool {
        match key {
            PanelKey::Char('o') => self.open_project(0),
            PanelKey::Char(c @ '1'..='9') => self.open_project(c as usize - '1' as usize),
            other => self.base.scroll(other),
        }
    }
}

fn encode_project_path(path: &str) -> String {
    path.trim_matches('/').replace('/', "%2F")
}

fn render_summary(summary: &ProjectSummary) -> Vec<String> {
    let mut lines = vec![
        String::new(),
        format!(
            "{}  MRs: {}  Issues: {}  Stars: {}",
            summary.remote.path_with_namespace,
            summary.open_merge_requests,
            summary.remote.open_issues_count,
            summary.remote.star_count
        ),
    ];

    let sections: [(&str, Vec<String>); 4] = [
        (
            "Assigned MRs",
            summary
                .assigned_merge_requests
                .iter()
                .map(|mr| format!("!{} {}", mr.iid, mr.title))
                .collect(),
        ),
        (
            "My MRs",
            summary
                .authored_merge_requests
                .iter()
                .map(|mr| format!("!{} {}", mr.iid, mr.title))
                .collect(),
        ),
        (
            "Assigned issues",
            summary
                .assigned_issues
                .iter()
                .map(|i| format!("#{} {}", i.iid, i.title))
                .collect(),
        ),
        (
            "My issues",
            summary
                .authored_issues
                .iter()
                .map(|i| format!("#{} {}", i.iid, i.title))
                .collect(),
        ),
    ];

    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        lines.push(format!("  {}", heading));
        lines.extend(items.iter().take(LIST_LIMIT).map(|item| format!("    {}", item)));
        if items.len() > LIST_LIMIT {
            lines.push(format!("    ... {} more", items.len() - LIST_LIMIT));
        }
    }

    lines
}
