// Streaming dashboard service - Progressive loading, one message per widget
use crate::application::dashboard_service::DashboardService;
use crate::domain::dashboard::WidgetResult;
use crate::domain::period::PeriodFilter;
use crate::domain::role::{Role, VisibilityScope, WidgetKind};
use futures::future::join_all;
use serde::Serialize;
use std::time::Instant;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSkeleton {
    pub id: String,
    pub title: &'static str,
    pub kind: WidgetKind,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StreamMessage {
    #[serde(rename_all = "camelCase")]
    Skeleton {
        role: Role,
        period: PeriodFilter,
        widgets: Vec<WidgetSkeleton>,
    },
    Widget(WidgetResult),
    #[serde(rename_all = "camelCase")]
    Complete {
        total_widgets: usize,
        duration_ms: u64,
    },
}

#[derive(Clone)]
pub struct StreamingDashboardService {
    dashboard_service: DashboardService,
    channel_capacity: usize,
}

impl StreamingDashboardService {
    pub fn new(dashboard_service: DashboardService, channel_capacity: usize) -> Self {
        Self {
            dashboard_service,
            channel_capacity,
        }
    }

    /// Sends the skeleton immediately, then each widget as soon as its query
    /// finishes, then a completion event once every widget task has ended.
    pub async fn stream_dashboard(
        &self,
        role: Role,
        scope: VisibilityScope,
        period: PeriodFilter,
    ) -> mpsc::Receiver<StreamMessage> {
        let (tx, rx) = mpsc::channel(self.channel_capacity.max(1));
        let start_time = Instant::now();
        let widgets = role.widgets();

        // 1. Skeleton
        let skeleton = StreamMessage::Skeleton {
            role,
            period: period.clone(),
            widgets: widgets
                .iter()
                .map(|w| WidgetSkeleton {
                    id: w.id(),
                    title: w.title(),
                    kind: w.kind(),
                })
                .collect(),
        };
        let total_widgets = widgets.len();
        let _ = tx.send(skeleton).await;

        // 2. One task per widget
        let mut handles = Vec::with_capacity(total_widgets);
        for widget in widgets {
            let tx = tx.clone();
            let service = self.dashboard_service.clone();
            let period = period.clone();

            handles.push(tokio::spawn(async move {
                let outcome = service.evaluate(widget, scope, &period).await;
                if let Err(e) = &outcome {
                    tracing::warn!("Streamed widget {} failed: {:#}", widget.id(), e);
                }
                let _ = tx
                    .send(StreamMessage::Widget(WidgetResult::from_outcome(widget, outcome)))
                    .await;
            }));
        }

        // 3. Completion after every widget task has finished
        tokio::spawn(async move {
            join_all(handles).await;

            let duration_ms = start_time.elapsed().as_millis() as u64;
            tracing::debug!("Dashboard stream for {} completed in {}ms", role, duration_ms);
            let _ = tx
                .send(StreamMessage::Complete {
                    total_widgets,
                    duration_ms,
                })
                .await;
        });

        rx
    }
}
