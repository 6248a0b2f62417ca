//! Training loop tests.
//!
//! These tests drive [`Trainer`] through the full environment wrapper stack
//! with a learner double, so every cadence is observable without a network.

use super::fixtures::{host, Corridor, RecordingLearner, RecordingLogger, N_ACTIONS};
use crate::algorithms::DqnConfig;
use crate::checkpoint::BestCheckpoint;
use crate::environment::VectorizedEnv;
use crate::error::{ConfigError, DriveError};
use crate::evaluation::{EvalConfig, EvalScheduler};
use crate::runners::Trainer;
use crate::scheduling::ExplorationSchedule;

fn small_config() -> DqnConfig {
    DqnConfig::default()
        .with_buffer_size(100)
        .with_batch_size(4)
        .with_train_freq(4)
        .with_learning_starts(8)
        .with_target_update_interval(1_000)
}

// ============================================================================
// Budget and warm-up
// ============================================================================

/// INTENT: a zero or negative budget is a configuration error raised before
/// the host is reset or stepped.
#[test]
fn test_non_positive_budget_rejected_before_interaction() {
    let corridor = Corridor::new(5);
    let (steps, resets) = (corridor.steps.clone(), corridor.resets.clone());
    let mut env = host(vec![corridor]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    for budget in [0, -10] {
        let err = trainer
            .learn(&mut env, budget, &mut RecordingLogger::default())
            .unwrap_err();
        assert!(matches!(
            err,
            DriveError::Config(ConfigError::NonPositiveStepBudget(b)) if b == budget
        ));
    }
    assert_eq!(steps.get(), 0);
    assert_eq!(resets.get(), 0);
}

/// INTENT: with the default buffer and batch, a budget equal to the warm-up
/// threshold never trains.
#[test]
fn test_no_update_when_budget_equals_warm_up() {
    let config = DqnConfig::default()
        .with_buffer_size(50_000)
        .with_batch_size(32)
        .with_learning_starts(10_000);
    let mut env = host(vec![Corridor::new(50)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), config).unwrap();

    let summary = trainer
        .learn(&mut env, 10_000, &mut RecordingLogger::default())
        .unwrap();

    assert_eq!(summary.timesteps, 10_000);
    assert_eq!(summary.n_updates, 0);
    assert_eq!(trainer.buffer().len(), 10_000);
    assert_eq!(trainer.learner().greedy_calls.get(), 0, "warm-up acts randomly");
}

#[test]
fn test_hyperparameters_validated_on_construction() {
    let config = DqnConfig::default().with_buffer_size(16).with_batch_size(32);
    let err = Trainer::new(RecordingLearner::default(), config).err();
    assert!(matches!(
        err,
        Some(DriveError::Config(ConfigError::BufferSmallerThanBatch { .. }))
    ));
}

/// INTENT: a second `learn` on the same trainer spends its own budget
/// instead of returning at once on the counters of the first run.
#[test]
fn test_consecutive_learn_calls_each_spend_their_budget() {
    let corridor = Corridor::new(5);
    let steps = corridor.steps.clone();
    let mut env = host(vec![corridor]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    let first = trainer
        .learn(&mut env, 20, &mut RecordingLogger::default())
        .unwrap();
    let second = trainer
        .learn(&mut env, 20, &mut RecordingLogger::default())
        .unwrap();

    assert_eq!(first.host_steps, 20);
    assert_eq!(second.host_steps, 20);
    assert_eq!(second.timesteps, 20);
    assert_eq!(second.episodes, 4);
    assert_eq!(steps.get(), 40);
    assert_eq!(trainer.buffer().len(), 40);
    // Updates at host steps 12, 16 and 20 of each run.
    assert_eq!(second.n_updates, 6);
}

// ============================================================================
// Cadence
// ============================================================================

/// INTENT: one update every `train_freq` host steps once strictly past
/// warm-up.
#[test]
fn test_update_cadence() {
    let mut env = host(vec![Corridor::new(5)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    let summary = trainer
        .learn(&mut env, 40, &mut RecordingLogger::default())
        .unwrap();

    // Host steps 12, 16, ..., 40.
    assert_eq!(summary.n_updates, 8);
    assert!(trainer.learner().batch_sizes.iter().all(|&n| n == 4));
}

#[test]
fn test_gradient_steps_per_update() {
    let config = small_config().with_gradient_steps(3);
    let mut env = host(vec![Corridor::new(5)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), config).unwrap();

    let summary = trainer
        .learn(&mut env, 16, &mut RecordingLogger::default())
        .unwrap();

    // Updates at host steps 12 and 16.
    assert_eq!(summary.n_updates, 6);
}

/// INTENT: the target period is measured in host steps, so it is divided by
/// the number of environments.
#[test]
fn test_target_sync_period_scales_with_envs() {
    let config = small_config().with_target_update_interval(10);
    let mut env = host(vec![Corridor::new(5), Corridor::new(7)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), config).unwrap();

    let summary = trainer
        .learn(&mut env, 40, &mut RecordingLogger::default())
        .unwrap();

    assert_eq!(summary.host_steps, 20);
    assert_eq!(summary.target_syncs, 4);
    assert_eq!(trainer.learner().syncs, 4);
}

#[test]
fn test_budget_rounds_up_to_whole_host_steps() {
    let mut env = host(vec![Corridor::new(5), Corridor::new(5), Corridor::new(5)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    let summary = trainer
        .learn(&mut env, 10, &mut RecordingLogger::default())
        .unwrap();

    assert_eq!(summary.host_steps, 4);
    assert_eq!(summary.timesteps, 12);
}

// ============================================================================
// Replay contents
// ============================================================================

/// INTENT: a finished episode stores its own last frame as next observation
/// and keeps the truncation flag.
#[test]
fn test_episode_end_transitions() {
    let horizon = 4;
    let mut env = host(vec![Corridor::new(horizon)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    trainer
        .learn(&mut env, 12, &mut RecordingLogger::default())
        .unwrap();

    let finished: Vec<_> = trainer.buffer().iter().filter(|t| t.done()).collect();
    assert_eq!(finished.len(), 3);
    for transition in finished {
        assert!(transition.truncated);
        assert!(!transition.terminated);
        assert_eq!(transition.observation.data()[0] as usize, horizon - 1);
        assert_eq!(transition.next_observation.data()[0] as usize, horizon);
    }

    let running: Vec<_> = trainer.buffer().iter().filter(|t| !t.done()).collect();
    assert!(running
        .iter()
        .all(|t| t.next_observation.data()[0] == t.observation.data()[0] + 1));
    assert!(trainer.buffer().iter().all(|t| t.action < N_ACTIONS));
}

// ============================================================================
// Evaluation interleaving
// ============================================================================

/// INTENT: evaluation runs on the shared host every `eval_freq` host steps
/// and training continues to the full budget afterwards.
#[test]
fn test_evaluation_interleaves_with_training() {
    let mut env = host(vec![Corridor::new(3)]);
    let eval = EvalScheduler::new(EvalConfig::new(10, 2), BestCheckpoint::in_memory()).unwrap();
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config())
        .unwrap()
        .with_evaluation(eval);
    let mut logger = RecordingLogger::default();

    let summary = trainer.learn(&mut env, 30, &mut logger).unwrap();

    assert_eq!(summary.timesteps, 30);
    assert_eq!(summary.evaluations, 3);
    assert_eq!(logger.evaluations.len(), 3);
    assert_eq!(
        logger.evaluations.iter().map(|r| r.step).collect::<Vec<_>>(),
        vec![10, 20, 30]
    );
    // Every evaluation episode runs to the 3-step time limit.
    assert_eq!(summary.best_mean_reward, Some(3.0));
    assert!(trainer.learner().greedy_calls.get() >= 6);
}

/// INTENT: an environment failure inside an evaluation pass is absorbed; the
/// next pass succeeds and training reaches its budget.
#[test]
fn test_failed_evaluation_pass_is_recovered() {
    // Training uses lifetime calls 1..=10, evaluation starts at call 11.
    let corridor = Corridor::new(3).failing_at([11]);
    let mut env = host(vec![corridor]);
    let dir = tempfile::tempdir().unwrap();
    let eval = EvalScheduler::new(
        EvalConfig::new(10, 1).with_max_consecutive_failures(2),
        BestCheckpoint::new(dir.path()).unwrap(),
    )
    .unwrap();
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config())
        .unwrap()
        .with_evaluation(eval);
    let mut logger = RecordingLogger::default();

    let summary = trainer.learn(&mut env, 30, &mut logger).unwrap();

    assert_eq!(summary.timesteps, 30);
    assert_eq!(summary.evaluations, 2);
    let history = trainer.evaluation().unwrap().history();
    assert_eq!(history[0].step, 20, "failed pass left no result");
    assert_eq!(trainer.learner().saves.borrow().len(), 1);
}

/// INTENT: a failure while training (not evaluating) ends the run with the
/// environment error.
#[test]
fn test_training_failure_is_fatal() {
    let mut env = host(vec![Corridor::new(3).failing_at([5])]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();

    let err = trainer
        .learn(&mut env, 30, &mut RecordingLogger::default())
        .unwrap_err();

    assert!(err.is_environment());
    assert_eq!(trainer.metrics().host_steps(), 4);
}

// ============================================================================
// Logging and persistence
// ============================================================================

#[test]
fn test_progress_logged_every_interval_episodes() {
    let mut env = host(vec![Corridor::new(2)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config())
        .unwrap()
        .with_log_interval(2);
    let mut logger = RecordingLogger::default();

    // 20 steps at horizon 2: 10 episodes, a report every 2 plus the final one.
    trainer.learn(&mut env, 20, &mut logger).unwrap();

    assert_eq!(logger.snapshots.len(), 6);
    assert_eq!(logger.flushes, 1);
    let first = &logger.snapshots[0];
    assert_eq!(first.episodes, 2);
    assert_eq!(first.avg_reward, 2.0);
    assert_eq!(first.avg_length, 2.0);
    let last = logger.snapshots.last().unwrap();
    assert_eq!(last.timesteps, 20);
    assert!(last.loss.is_some());
}

#[test]
fn test_seeded_runs_are_reproducible() {
    let run = || {
        let mut env = host(vec![Corridor::new(6)]);
        let mut trainer = Trainer::new(RecordingLearner::default(), small_config())
            .unwrap()
            .with_seed(7);
        trainer
            .learn(&mut env, 24, &mut RecordingLogger::default())
            .unwrap();
        trainer.buffer().iter().map(|t| t.action).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_save_delegates_to_learner() {
    let trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();
    trainer.save("dqn_drive_policy").unwrap();
    assert_eq!(
        trainer.learner().saves.borrow().as_slice(),
        &[std::path::PathBuf::from("dqn_drive_policy")]
    );
}

#[test]
fn test_host_is_left_usable() {
    let mut env = host(vec![Corridor::new(3)]);
    let mut trainer = Trainer::new(RecordingLearner::default(), small_config()).unwrap();
    trainer
        .learn(&mut env, 10, &mut RecordingLogger::default())
        .unwrap();
    assert_eq!(env.n_envs(), 1);
    assert!(env.step(&[0]).is_ok());
}

#[test]
fn test_short_greedy_answer_is_a_shape_error() {
    let config = small_config()
        .with_learning_starts(0)
        .with_exploration(ExplorationSchedule::new(0.0, 0.0, 0.0));
    let corridor = Corridor::new(5);
    let steps = corridor.steps.clone();
    let mut env = host(vec![corridor, Corridor::new(5)]);
    let learner = RecordingLearner {
        short_answers: 1,
        ..Default::default()
    };
    let mut trainer = Trainer::new(learner, config).unwrap();

    let err = trainer
        .learn(&mut env, 10, &mut RecordingLogger::default())
        .unwrap_err();

    assert!(matches!(
        err,
        DriveError::ShapeMismatch {
            context: "greedy actions",
            ..
        }
    ));
    assert_eq!(steps.get(), 0);
}
