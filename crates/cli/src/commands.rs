//! CLI commands

use anyhow::{Context, Result, anyhow};
use clap::Subcommand;
use echo_core::{AuthFailure, AuthSuccess, CredentialStore, MockCredentialStore, NewUser, Toaster};
use echo_http::types::{
    ChatRequest, Envelope, LoginRequest, RegisterRequest, User, UserChatsRequest,
};
use echo_http::{ClientError, EchoClient};
use std::path::PathBuf;
use tracing::info;

use crate::config;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        /// Username or email
        #[arg(long)]
        identifier: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        remember_me: bool,
    },

    /// Create an account
    Register {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Defaults to the password
        #[arg(long)]
        confirm_password: Option<String>,

        #[arg(long)]
        agree_terms: bool,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user as reported by the server
    Whoami,

    /// Send a chat message
    Send {
        message: String,

        /// Conversation to append to; a new one is created when omitted
        #[arg(long)]
        chat_id: Option<String>,
    },

    /// List conversations
    History,

    /// Show the messages of a conversation
    Messages { chat_id: String },

    /// Start a new conversation
    NewChat,

    /// List conversations of the signed-in user, one page at a time
    Chats {
        #[arg(long, default_value_t = UserChatsRequest::DEFAULT_PAGE)]
        page: u32,

        #[arg(long, default_value_t = UserChatsRequest::DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },

    /// Delete a conversation
    DeleteChat { chat_id: String },

    /// Upload a file
    Upload { path: PathBuf },

    /// Log in against the built-in mock credential store
    MockLogin {
        #[arg(long)]
        identifier: String,

        #[arg(long)]
        password: String,
    },

    /// Register against the built-in mock credential store
    MockRegister {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Configuration file operations
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the default client configuration
    Init {
        /// Output file path (defaults to <data-dir>/config.json)
        output: Option<PathBuf>,
    },
}

/// Everything a command needs, passed explicitly
pub struct AppContext {
    pub client: EchoClient,
    pub toaster: Toaster,
    pub data_dir: PathBuf,
}

impl AppContext {
    fn signed_in_user(&self) -> Result<User> {
        self.client
            .current_user()?
            .ok_or_else(|| anyhow!("Not signed in, run `echo-chat login` first"))
    }

    fn print_json<T: serde::Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Show a client failure as an error toast and pass it on
    fn report(&self, error: ClientError) -> anyhow::Error {
        self.toaster.error(error.user_message());
        error.into()
    }
}

impl Commands {
    pub async fn execute(self, ctx: &AppContext) -> Result<()> {
        match self {
            Commands::Login {
                identifier,
                password,
                remember_me,
            } => {
                let request = LoginRequest {
                    identifier,
                    password,
                    remember_me,
                };
                let user = ctx.client.sign_in(&request).await.map_err(|e| ctx.report(e))?;
                ctx.toaster.success(format!("欢迎回来，{}", user.username));
                Ok(())
            }
            Commands::Register {
                username,
                email,
                password,
                confirm_password,
                agree_terms,
            } => {
                let request = RegisterRequest {
                    username,
                    email,
                    confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                    password,
                    agree_terms,
                };
                let response = ctx
                    .client
                    .register(&request)
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                if let Some(user) = response.user {
                    ctx.toaster.success(format!("注册成功：{}", user.username));
                }
                Ok(())
            }
            Commands::Logout => {
                // Local session is gone either way; only report the server side
                if let Err(e) = ctx.client.sign_out().await {
                    ctx.toaster.warning(e.user_message());
                }
                ctx.toaster.info("已退出登录");
                Ok(())
            }
            Commands::Whoami => {
                let response = ctx
                    .client
                    .get_user_info()
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                ctx.print_json(&response.user)
            }
            Commands::Send { message, chat_id } => {
                let user_id = ctx.client.current_user()?.map(|u| u.id);
                let request = ChatRequest {
                    message,
                    chat_id,
                    user_id,
                };
                let response = ctx
                    .client
                    .send_message(&request)
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;

                if let Some(reply) = &response.response {
                    println!("{}", reply.content);
                }
                if let Some(chat_id) = &response.chat_id {
                    info!(%chat_id, "message delivered");
                }
                Ok(())
            }
            Commands::History => {
                let response = ctx
                    .client
                    .chat_history()
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                ctx.print_json(&response.chats)
            }
            Commands::Messages { chat_id } => {
                let response = ctx
                    .client
                    .chat_messages(&chat_id)
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                for message in &response.messages {
                    println!("{}: {}", message.role, message.content);
                }
                Ok(())
            }
            Commands::NewChat => {
                let user = ctx.signed_in_user()?;
                let response = ctx
                    .client
                    .create_chat(Some(&user.id))
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                if let Some(chat) = &response.chat {
                    ctx.toaster.success(format!("已创建对话 {}", chat.id));
                }
                Ok(())
            }
            Commands::Chats { page, page_size } => {
                let user = ctx.signed_in_user()?;
                let query = UserChatsRequest {
                    user_id: user.id,
                    page,
                    page_size,
                };
                let response = ctx
                    .client
                    .user_chats_paginated(&query)
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                ctx.print_json(&response.chats)?;
                if let Some(pagination) = response.pagination {
                    println!(
                        "page {}/{} ({} total)",
                        pagination.page, pagination.total_pages, pagination.total_count
                    );
                }
                Ok(())
            }
            Commands::DeleteChat { chat_id } => {
                ctx.client
                    .delete_chat(&chat_id)
                    .await
                    .and_then(Envelope::into_result)
                    .map_err(|e| ctx.report(e))?;
                ctx.toaster.success("对话已删除");
                Ok(())
            }
            Commands::Upload { path } => {
                let response = ctx
                    .client
                    .upload_path(&path)
                    .await
                    .map_err(|e| ctx.report(e))?;
                ctx.toaster.success("上传成功");
                ctx.print_json(&response)
            }
            Commands::MockLogin {
                identifier,
                password,
            } => {
                let store = MockCredentialStore::new();
                match store.login(&identifier, &password).await {
                    Ok(user) => ctx.print_json(&AuthSuccess::from(user)),
                    Err(e) => {
                        ctx.toaster.error(e.to_string());
                        ctx.print_json(&AuthFailure::from(e))?;
                        Err(e.into())
                    }
                }
            }
            Commands::MockRegister {
                username,
                email,
                password,
            } => {
                let store = MockCredentialStore::new();
                let new_user = NewUser {
                    username,
                    email,
                    password,
                    avatar: None,
                };
                match store.register(new_user).await {
                    Ok(user) => ctx.print_json(&AuthSuccess::from(user)),
                    Err(e) => {
                        ctx.toaster.error(e.to_string());
                        ctx.print_json(&AuthFailure::from(e))?;
                        Err(e.into())
                    }
                }
            }
            Commands::Config { command } => command.execute(&ctx.data_dir),
        }
    }
}

impl ConfigCommands {
    pub fn execute(self, data_dir: &std::path::Path) -> Result<()> {
        match self {
            ConfigCommands::Init { output } => {
                let path = output.unwrap_or_else(|| data_dir.join(config::CONFIG_FILE));
                config::generate_default_config(&path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("Generated default configuration at {}", path.display());
                println!("{}", path.display());
                Ok(())
            }
        }
    }
}
