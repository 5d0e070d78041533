use std::io::Write;
use std::net::SocketAddr;

use anyhow::{Context, bail};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_steward::config::{Command, Config, HookAction, Provider};
use repo_steward::effects::{GitHubEffect, GitHubInterpreter, GitHubResponse};
use repo_steward::generation::{Backend, GeminiBackend, OpenAiBackend, ResponseGenerator};
use repo_steward::github::{Governed, OctocrabClient, RateLimitCache};
use repo_steward::hooks;
use repo_steward::notify::{Notifier, OwnerNotifier, ResendNotifier};
use repo_steward::server::{AppState, ServiceInfo, build_router};
use repo_steward::style::ProfilerConfig;
use repo_steward::types::HookSpec;
use repo_steward::webhooks::Services;

/// Repositories named individually in the startup log.
const LOGGED_REPOS: usize = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repo_steward=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    match config.command.clone() {
        None | Some(Command::Serve) => serve(config).await,
        Some(Command::Hooks { action }) => manage_hooks(&config, action).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    let rate_limits = RateLimitCache::new();
    let client = OctocrabClient::from_token(config.github_token.clone())
        .context("building GitHub client")?;
    let github = Governed::new(client, rate_limits.clone());

    let login = match github.interpret(GitHubEffect::GetAuthenticatedUser).await {
        Ok(GitHubResponse::User { login }) => login,
        Ok(other) => bail!("unexpected response to get_authenticated_user: {other:?}"),
        Err(e) => return Err(e).context("resolving the authenticated GitHub user"),
    };
    tracing::info!(login = %login, "Authenticated with GitHub");

    let repos = match github.interpret(GitHubEffect::ListPublicRepos).await {
        Ok(GitHubResponse::Repos(repos)) => repos,
        Ok(other) => bail!("unexpected response to list_public_repos: {other:?}"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not list repositories");
            Vec::new()
        }
    };
    for repo in repos.iter().take(LOGGED_REPOS) {
        tracing::info!(repo = %repo, "Managing repository");
    }
    if repos.len() > LOGGED_REPOS {
        tracing::info!(more = repos.len() - LOGGED_REPOS, "...and more repositories");
    }
    tracing::info!(count = repos.len(), "Webhooks are accepted for any repository the token can reach");

    let http = reqwest::Client::new();
    let api_key = config
        .provider_api_key()
        .context("provider API key missing after validation")?;
    let backend = match config.ai_provider {
        Provider::Gemini => Backend::Gemini(GeminiBackend::new(
            http.clone(),
            api_key,
            config.model(),
            config.system_prompt.clone(),
        )),
        Provider::OpenAi => Backend::OpenAi(OpenAiBackend::new(
            http.clone(),
            api_key,
            config.model(),
            config.system_prompt.clone(),
        )),
    };
    tracing::info!(provider = backend.provider(), model = backend.model(), "Generation backend selected");

    let notifier = match config.email() {
        Some((key, to)) => {
            tracing::info!(recipient = to, "Email notifications enabled");
            OwnerNotifier::Resend(ResendNotifier::new(http, key, config.notify_from.clone(), to))
        }
        None => {
            tracing::warn!("RESEND_API_KEY or OWNER_EMAIL not set; email notifications disabled");
            OwnerNotifier::Disabled
        }
    };

    let info = ServiceInfo {
        provider: config.ai_provider.to_string(),
        model: config.model().to_string(),
        notifications_enabled: notifier.is_enabled(),
        login: login.clone(),
        managed_repositories: repos.len(),
    };

    let services = Services {
        github,
        generator: ResponseGenerator::new(backend, config.generation_max_retries),
        notifier,
        bot_login: login,
        profiler: ProfilerConfig {
            limit: config.profile_comment_limit,
            scan_window: config.profile_scan_window,
        },
    };

    let app = build_router(AppState::new(
        services,
        config.webhook_secret.clone(),
        info,
        rate_limits,
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

async fn manage_hooks(config: &Config, action: HookAction) -> anyhow::Result<()> {
    config.validate_hooks(&action)?;

    let client = OctocrabClient::from_token(config.github_token.clone())
        .context("building GitHub client")?;
    let github = Governed::new(client, RateLimitCache::new());
    let repos = hooks::public_repos(&github).await?;
    println!("Found {} public repositories", repos.len());

    match action {
        HookAction::Setup { url, yes } => {
            if !yes && !confirm(&format!("This will add a webhook to {} repositories.", repos.len()))? {
                println!("Aborted");
                return Ok(());
            }
            let spec = HookSpec::new(url, config.webhook_secret.clone());
            let report = hooks::install_hooks(&github, &repos, &spec).await;
            println!("{report}");
        }
        HookAction::List => {
            let listings = hooks::list_hooks(&github, &repos).await;
            for listing in &listings {
                println!("{}", listing.repo);
                for hook in &listing.hooks {
                    let state = if hook.active { "active" } else { "inactive" };
                    let url = hook.url.as_deref().unwrap_or("N/A");
                    println!("  [{state}] {url}");
                    println!("      events: {}", hook.events.join(", "));
                }
            }
            let total: usize = listings.iter().map(|l| l.hooks.len()).sum();
            println!("Total webhooks found: {total}");
        }
        HookAction::Remove { url, yes } => {
            let question = format!(
                "This will remove webhooks delivering to {url} from {} repositories.",
                repos.len()
            );
            if !yes && !confirm(&question)? {
                println!("Aborted");
                return Ok(());
            }
            let report = hooks::remove_hooks(&github, &repos, &url).await;
            println!("Removed {} webhooks", report.removed.len());
            for (repo, reason) in &report.failed {
                println!("  {repo}: {reason}");
            }
        }
    }
    Ok(())
}

fn confirm(question: &str) -> anyhow::Result<bool> {
    print!("{question} Continue? (yes/no): ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin()
        .read_line(&mut answer)
        .context("reading confirmation")?;
    Ok(hooks::is_affirmative(&answer))
}
