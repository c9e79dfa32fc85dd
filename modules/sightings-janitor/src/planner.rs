use chrono::{DateTime, Utc};

use crate::config::Rules;
use crate::flair::AutoFlairGate;
use crate::lifecycle::{Action, LifecycleFacts, LifecycleMachine, PostState};
use crate::statement::{Classification, StatementClassifier};
use crate::types::PostSnapshot;

/// Ordered actions for one post, with the state and verdict behind them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub post_id: String,
    pub state: PostState,
    pub classification: Option<Classification>,
    pub actions: Vec<Action>,
}

impl Plan {
    fn idle(post: &PostSnapshot, state: PostState) -> Self {
        Self {
            post_id: post.id.clone(),
            state,
            classification: None,
            actions: vec![Action::NoOp],
        }
    }

    pub fn is_no_op(&self) -> bool {
        self.actions.iter().all(|a| matches!(a, Action::NoOp))
    }
}

/// Composes the auto-flair gate, the classifier and the lifecycle machine.
/// Pure: the same post and facts always give the same plan.
#[derive(Debug, Clone)]
pub struct ActionPlanner {
    gate: AutoFlairGate,
    classifier: StatementClassifier,
    lifecycle: LifecycleMachine,
}

impl ActionPlanner {
    pub fn new(rules: &Rules) -> Self {
        Self {
            gate: AutoFlairGate::new(rules),
            classifier: StatementClassifier::new(rules.empty_location),
            lifecycle: LifecycleMachine::new(rules),
        }
    }

    pub fn plan(&self, post: &PostSnapshot, facts: &LifecycleFacts, now: DateTime<Utc>) -> Plan {
        if post.actioned || post.removed {
            return Plan::idle(post, PostState::AlreadyActioned);
        }

        let mut actions = Vec::new();
        if !facts.has_label {
            if post.flair.is_some() {
                return Plan::idle(post, PostState::OtherLabel);
            }
            if !self.gate.should_auto_flair(post) {
                return Plan::idle(post, PostState::Unlabeled);
            }
            actions.push(Action::ApplyLabel);
        }

        let classification = self.classifier.classify(post);
        let decision = self.lifecycle.decide(&classification, post.age(now), facts);
        actions.extend(
            decision
                .actions
                .into_iter()
                .filter(|a| !matches!(a, Action::NoOp)),
        );
        if actions.is_empty() {
            actions.push(Action::NoOp);
        }

        Plan {
            post_id: post.id.clone(),
            state: decision.state,
            classification: Some(classification),
            actions,
        }
    }
}
