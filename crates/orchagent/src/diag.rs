//! Diagnostic channel answering readiness queries in every FSM state.

use std::sync::Arc;

use async_trait::async_trait;
use sonic_orch_common::{
    DbResult, Executor, ExecutorSet, NotificationConsumer, NotificationMessage, NotificationProducer, Orch,
    OrchResult,
};

use crate::context::SharedRuntimeContext;
use crate::fsm::OrchFsm;
use crate::tables::{reply, SWSS_DIAG_CHANNEL, SWSS_DIAG_REPLY};
use crate::{debug_log, warn_log};

const NAME: &str = "DiagOrch";

pub struct DiagOrch {
    fsm: Arc<OrchFsm>,
    executors: ExecutorSet,
    reply: NotificationProducer,
}

impl DiagOrch {
    pub async fn new(ctx: &SharedRuntimeContext) -> DbResult<Self> {
        let mut executors = ExecutorSet::new();
        executors.add_notification(NotificationConsumer::new(&ctx.dbs.appl, SWSS_DIAG_CHANNEL).await?);
        Ok(Self {
            fsm: Arc::clone(&ctx.fsm),
            executors,
            reply: NotificationProducer::new(Arc::clone(&ctx.dbs.appl), SWSS_DIAG_REPLY),
        })
    }

    async fn do_request(&self, request: NotificationMessage) -> DbResult<()> {
        debug_log!(NAME, "diag request {}", request.op);
        if request.op == "state" {
            let state = self.fsm.get();
            let values = vec![("state".to_string(), state.as_str().to_string())];
            self.reply.send(reply::SUCCESS, "state", values).await?;
        } else {
            warn_log!(NAME, "Unsupported diag operation {}", request.op);
            self.reply.send(reply::FAILED, &request.op, Vec::new()).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Orch for DiagOrch {
    fn name(&self) -> &str {
        NAME
    }

    async fn ready_executor(&self) -> Option<Executor> {
        self.executors.ready().await
    }

    async fn execute(&mut self, executor: Executor) -> OrchResult<()> {
        if let Executor::Notification(index) = executor {
            if let Some(request) = self.executors.pop_notification(index) {
                self.do_request(request).await?;
            }
        }
        Ok(())
    }

    async fn do_task(&mut self) -> OrchResult<()> {
        Ok(())
    }
}
