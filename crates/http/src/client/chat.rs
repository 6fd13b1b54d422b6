//! Chat API client methods

use super::{ClientError, EchoClient};
use crate::types::{
    AckResponse, ChatListResponse, ChatRequest, ChatResponse, CreateChatRequest,
    CreateChatResponse, MessagesResponse, UserChatsRequest,
};
use reqwest::Method;
use tracing::{debug, error};

impl EchoClient {
    /// Send a message, logging the exchange
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn send_message(&self, message: &ChatRequest) -> Result<ChatResponse, ClientError> {
        debug!(chat_id = ?message.chat_id, "sending chat message");
        let request = self.request(Method::POST, "/chat/send").json(message);

        self.execute::<ChatResponse>(request)
            .await
            .inspect(|response| {
                debug!(
                    success = response.success,
                    chat_id = ?response.chat_id,
                    "chat message response"
                );
            })
            .inspect_err(|e| {
                error!(error = %e, status = ?e.status(), "send message failed");
            })
    }

    /// List conversations of the signed-in user
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn chat_history(&self) -> Result<ChatListResponse, ClientError> {
        let request = self.request(Method::GET, "/chat/history");
        self.execute(request).await
    }

    /// Fetch the messages of one conversation
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn chat_messages(&self, chat_id: &str) -> Result<MessagesResponse, ClientError> {
        let request = self.request(Method::GET, &format!("/chat/history/{chat_id}"));
        self.execute(request).await
    }

    /// Create a conversation owned by `user_id`
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn create_chat(
        &self,
        user_id: Option<&str>,
    ) -> Result<CreateChatResponse, ClientError> {
        let body = CreateChatRequest {
            user_id: user_id.map(str::to_string),
        };
        let request = self.request(Method::POST, "/chat/new").json(&body);
        self.execute(request).await
    }

    /// Delete a conversation
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn delete_chat(&self, chat_id: &str) -> Result<AckResponse, ClientError> {
        let request = self.request(Method::DELETE, &format!("/chat/{chat_id}"));
        self.execute(request).await
    }

    /// All conversations of `user_id`
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn user_chats(&self, user_id: &str) -> Result<ChatListResponse, ClientError> {
        let request = self.request(Method::GET, &format!("/auth/chats/{user_id}"));
        self.execute(request).await
    }

    /// One page of the conversations of a user
    ///
    /// # Errors
    ///
    /// Returns the [`ClientError`] from [`EchoClient::execute`]
    pub async fn user_chats_paginated(
        &self,
        query: &UserChatsRequest,
    ) -> Result<ChatListResponse, ClientError> {
        let request = self.request(Method::POST, "/auth/chats").json(query);
        self.execute(request).await
    }
}
