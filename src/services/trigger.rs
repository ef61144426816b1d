//! Special-event trigger evaluation.
//!
//! Each agent has a condition under which a schedule entry counts as a
//! special event (李白 turning in for the night, 莊子 reaching the river,
//! and so on). The model is asked for a strict True/False verdict.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::models::config::SpecialCondition;
use crate::domain::models::ScheduleEntry;
use crate::domain::ports::TextGenerator;

pub struct TriggerService {
    generator: Arc<dyn TextGenerator>,
    conditions: Vec<SpecialCondition>,
}

impl TriggerService {
    pub fn new(generator: Arc<dyn TextGenerator>, conditions: Vec<SpecialCondition>) -> Self {
        Self { generator, conditions }
    }

    /// Whether this entry matches one of the special-event conditions.
    ///
    /// Anything other than a clear "True" counts as not-special; a hedging
    /// model never fires a trigger by accident.
    pub async fn is_special(&self, agent_name: &str, entry: &ScheduleEntry) -> Result<bool> {
        let prompt = self.build_prompt(agent_name, entry)?;
        let reply = self.generator.generate(&prompt).await?;
        Ok(reply.trim().eq_ignore_ascii_case("true"))
    }

    fn build_prompt(&self, agent_name: &str, entry: &ScheduleEntry) -> Result<String> {
        let event = serde_json::to_string(entry)?;
        let mut conditions = String::new();
        for (i, c) in self.conditions.iter().enumerate() {
            let _ = writeln!(conditions, "            {}）{}：{}", i + 1, c.agent, c.condition);
        }
        Ok(format!(
            r#"請爲我判斷以下事件是否符合特殊事件的條件
        判斷事件：{agent_name}:{event}
        特殊事件條件：
{conditions}        以上條件任只要滿足其中一條即判斷其為特殊事件
        若是特殊事件，回應"True"，否則則回應"False"，你的回復必須嚴格遵照規則
        "#
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedGenerator {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.replies.lock().unwrap().remove(0))
        }
    }

    fn entry() -> ScheduleEntry {
        ScheduleEntry {
            time_str: "22:00".to_string(),
            location: "河邊".to_string(),
            action: "準備睡覺".to_string(),
            thought: String::new(),
            dialogue: String::new(),
        }
    }

    fn service(replies: &[&str]) -> TriggerService {
        TriggerService::new(
            Arc::new(CannedGenerator {
                replies: Mutex::new(replies.iter().map(ToString::to_string).collect()),
            }),
            vec![SpecialCondition {
                agent: "李白".to_string(),
                condition: "晚上李白準備睡覺時".to_string(),
            }],
        )
    }

    #[tokio::test]
    async fn true_replies_fire_case_insensitively() {
        assert!(service(&["True"]).is_special("李白", &entry()).await.unwrap());
        assert!(service(&["true\n"]).is_special("李白", &entry()).await.unwrap());
    }

    #[tokio::test]
    async fn anything_else_does_not_fire() {
        assert!(!service(&["False"]).is_special("李白", &entry()).await.unwrap());
        assert!(!service(&["可能是True吧"]).is_special("李白", &entry()).await.unwrap());
    }
}
