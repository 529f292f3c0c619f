//! Episode detail enrichment coordinator
//!
//! A single actor task owns the [`SelectionState`]. Commands from handles and
//! completions from request tasks arrive through one inbox and are applied one
//! at a time. After each message the view is published on a `watch` channel.
//!
//! Request tasks are never aborted. They hold only a weak sender, so the actor
//! stops once every handle is dropped and late completions are dropped with it.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};

use crate::model::{EnrichmentResult, EpisodeDetail, SelectionView, SessionToken};
use crate::retriever::{EpisodeRetriever, InsightRequester, RetrieverError};

pub mod error;
pub mod state;

pub use error::CoordinatorError;
pub use state::{Effect, SelectionState};

enum Message {
    Select {
        episode_id: String,
        reply: oneshot::Sender<SessionToken>,
    },
    Close {
        reply: oneshot::Sender<()>,
    },
    RetryEnrichment {
        reply: oneshot::Sender<Result<SessionToken, CoordinatorError>>,
    },
    BaseFetched {
        token: SessionToken,
        result: Result<EpisodeDetail, RetrieverError>,
    },
    InsightsSettled {
        token: SessionToken,
        outcome: Result<EnrichmentResult, RetrieverError>,
    },
}

/// Handle to the coordinator task
#[derive(Clone)]
pub struct EnrichmentCoordinator {
    inbox: mpsc::UnboundedSender<Message>,
    view: watch::Receiver<SelectionView>,
}

impl EnrichmentCoordinator {
    /// Spawn the coordinator task on the current tokio runtime
    pub fn spawn(
        retriever: Arc<dyn EpisodeRetriever>,
        requester: Arc<dyn InsightRequester>,
    ) -> Self {
        let (inbox, receiver) = mpsc::unbounded_channel();
        let (view_tx, view_rx) = watch::channel(SelectionView::default());

        let actor = CoordinatorActor {
            state: SelectionState::new(),
            retriever,
            requester,
            view: view_tx,
            inbox: inbox.downgrade(),
        };
        tokio::spawn(actor.run(receiver));

        Self {
            inbox,
            view: view_rx,
        }
    }

    /// Select an episode.
    ///
    /// Resolves once the new session is current and `LoadingBase` is visible,
    /// before the base fetch completes.
    pub async fn select(&self, episode_id: &str) -> Result<SessionToken, CoordinatorError> {
        let episode_id = episode_id.trim();
        if episode_id.is_empty() {
            return Err(CoordinatorError::InvalidEpisodeId);
        }

        let (reply, response) = oneshot::channel();
        self.send(Message::Select {
            episode_id: episode_id.to_string(),
            reply,
        })?;
        response.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Close the detail view
    pub async fn close(&self) -> Result<(), CoordinatorError> {
        let (reply, response) = oneshot::channel();
        self.send(Message::Close { reply })?;
        response.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Retry a failed enrichment for the current session
    pub async fn retry_enrichment(&self) -> Result<SessionToken, CoordinatorError> {
        let (reply, response) = oneshot::channel();
        self.send(Message::RetryEnrichment { reply })?;
        response.await.map_err(|_| CoordinatorError::Stopped)?
    }

    /// Snapshot of the current view
    pub fn view(&self) -> SelectionView {
        self.view.borrow().clone()
    }

    /// Snapshot of the view while `token` is still the current session
    pub fn view_of(&self, token: SessionToken) -> Result<SelectionView, CoordinatorError> {
        let view = self.view.borrow();
        if view.token == Some(token) {
            Ok(view.clone())
        } else {
            Err(CoordinatorError::Superseded(token))
        }
    }

    /// Receiver notified on every observable change
    pub fn subscribe(&self) -> watch::Receiver<SelectionView> {
        self.view.clone()
    }

    /// Whether the coordinator task still accepts messages
    pub fn is_running(&self) -> bool {
        !self.inbox.is_closed()
    }

    fn send(&self, message: Message) -> Result<(), CoordinatorError> {
        self.inbox
            .send(message)
            .map_err(|_| CoordinatorError::Stopped)
    }
}

struct CoordinatorActor {
    state: SelectionState,
    retriever: Arc<dyn EpisodeRetriever>,
    requester: Arc<dyn InsightRequester>,
    view: watch::Sender<SelectionView>,
    inbox: mpsc::WeakUnboundedSender<Message>,
}

impl CoordinatorActor {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Message>) {
        tracing::debug!("Enrichment coordinator started");

        while let Some(message) = receiver.recv().await {
            self.handle(message);
        }

        tracing::debug!("Enrichment coordinator stopped");
    }

    fn handle(&mut self, message: Message) {
        match message {
            Message::Select { episode_id, reply } => {
                let effect = self.state.select(&episode_id);
                let token = effect.token();
                self.publish();
                self.execute(effect);

                tracing::info!(token = %token, episode_id = %episode_id, "Episode selected");
                let _ = reply.send(token);
            }
            Message::Close { reply } => {
                self.state.close();
                self.publish();
                let _ = reply.send(());
            }
            Message::RetryEnrichment { reply } => {
                let result = self.state.retry_enrichment().map(|effect| {
                    let token = effect.token();
                    self.publish();
                    self.execute(effect);
                    token
                });

                if let Ok(token) = &result {
                    tracing::info!(token = %token, "Retrying insight generation");
                }
                let _ = reply.send(result);
            }
            Message::BaseFetched { token, result } => {
                let effect = self.state.on_base_fetched(token, result);
                self.publish();
                if let Some(effect) = effect {
                    self.execute(effect);
                }
            }
            Message::InsightsSettled { token, outcome } => {
                self.state.on_enrichment_settled(token, outcome);
                self.publish();
            }
        }
    }

    /// Publish the view, waking subscribers only when it changed
    fn publish(&self) {
        let next = self.state.view();
        self.view.send_if_modified(|current| {
            if *current == *next {
                false
            } else {
                *current = next.clone();
                true
            }
        });
    }

    fn execute(&self, effect: Effect) {
        let inbox = self.inbox.clone();

        match effect {
            Effect::FetchBase { token, episode_id } => {
                let retriever = Arc::clone(&self.retriever);
                tokio::spawn(async move {
                    let result = retriever.get_episode(&episode_id).await;
                    deliver(&inbox, Message::BaseFetched { token, result });
                });
            }
            Effect::RequestInsights { token, episode_id } => {
                let requester = Arc::clone(&self.requester);
                tokio::spawn(async move {
                    let outcome = requester.request_insights(&episode_id).await;
                    deliver(&inbox, Message::InsightsSettled { token, outcome });
                });
            }
        }
    }
}

fn deliver(inbox: &mpsc::WeakUnboundedSender<Message>, message: Message) {
    match inbox.upgrade() {
        Some(sender) => {
            let _ = sender.send(message);
        }
        None => tracing::debug!("Coordinator stopped, dropping response"),
    }
}
