use anyhow::Result;
use matmul_rl::env::{Action, EnvConfig, MatmulEnv};
use matmul_rl::eval::{render_latex, verify_triples, Verifier};
use matmul_rl::factors::{
    crossover, load_triples, mutate_factor, naive_seed, save_triples, SeedKind, Triple,
    MATRIX_DIM,
};
use matmul_rl::training::{Checkpoint, DynamicsConfig, TrainConfig, Trainer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

#[test]
fn seed_file_roundtrip_verifies() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("seeds").join("rank64.json");
    save_triples(&path, &naive_seed(MATRIX_DIM))?;

    let loaded = load_triples(&path)?;
    assert_eq!(loaded.len(), 64);
    assert!(verify_triples(&loaded));

    let report = Verifier::default().verify(&loaded);
    assert!(report.passed());
    assert_eq!(report.rank, 64);

    let latex = render_latex(&loaded);
    assert!(latex.starts_with("% LaTeX table for rank-64 factor triples"));
    Ok(())
}

#[test]
fn genetic_operators_break_or_keep_correctness() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(17);
    let naive = naive_seed(MATRIX_DIM);
    let identity = SeedKind::Identity.build(MATRIX_DIM);

    let mutated = mutate_factor(&naive, 0.05, &mut rng)?;
    assert_eq!(mutated.len(), naive.len());
    assert!(!verify_triples(&mutated));

    // Crossover of a candidate with itself reproduces it.
    let child = crossover(&naive, &naive, &mut rng)?;
    assert_eq!(child, naive);
    assert!(verify_triples(&child));

    assert!(crossover(&naive, &identity, &mut rng).is_err());
    Ok(())
}

#[test]
fn verified_environment_keeps_candidate_correct() -> Result<()> {
    let seed = naive_seed(MATRIX_DIM);
    let config = EnvConfig {
        max_steps: 20,
        ..EnvConfig::for_candidate(seed.len())
    }
    .with_seed(3);
    let mut env = MatmulEnv::verified(config, seed)?;
    env.reset(None);

    for action in [Action::Swap, Action::Mutate, Action::Prune].iter().cycle().take(20) {
        let step = env.step_action(*action);
        assert_eq!(env.current_rank(), 64);
        assert!(verify_triples(env.candidate().unwrap_or_default()));
        if step.done() {
            assert!(step.truncated);
            break;
        }
    }
    Ok(())
}

#[test]
fn short_training_run_writes_checkpoints() -> Result<()> {
    let dir = tempdir()?;
    let config = TrainConfig {
        run_id: "smoke".into(),
        max_iterations: 3,
        num_workers: 2,
        rollout_fragment_length: 16,
        train_batch_size: 32,
        checkpoint_freq: 2,
        results_dir: dir.path().to_path_buf(),
        seed: 9,
        ..TrainConfig::default()
    };
    let mut trainer = Trainer::new(config.clone())?;
    let summary = trainer.run()?;

    assert_eq!(summary.iterations, 3);
    assert_eq!(summary.total_steps, 3 * 2 * 16);
    assert!(summary.best_rank <= 46);

    let run_dir = dir.path().join("smoke");
    assert!(run_dir.join("summary.json").exists());
    let checkpoint = Checkpoint::load(run_dir.join("checkpoint_000003.json"))?;
    assert_eq!(checkpoint.iteration, 3);
    assert_eq!(checkpoint.config, config);
    Ok(())
}

#[test]
fn verified_training_from_seed_file() -> Result<()> {
    let dir = tempdir()?;
    let seed_path = dir.path().join("padded.json");
    let mut seed = SeedKind::Identity.build(MATRIX_DIM);
    seed.extend((0..48).map(|_| Triple::zeros(MATRIX_DIM)));
    assert!(verify_triples(&seed));
    save_triples(&seed_path, &seed)?;

    let config = TrainConfig {
        run_id: "verified".into(),
        max_iterations: 2,
        num_workers: 2,
        rollout_fragment_length: 16,
        train_batch_size: 16,
        results_dir: dir.path().to_path_buf(),
        dynamics: DynamicsConfig::Verified {
            seed_file: Some(seed_path),
            seed_kind: SeedKind::Naive,
        },
        ..TrainConfig::default()
    };
    let summary = Trainer::new(config)?.run()?;
    assert!((45..=49).contains(&summary.best_rank));
    assert_eq!(summary.checkpoints.len(), 1);
    Ok(())
}

#[test]
fn environment_floor_is_fixed() {
    let config = EnvConfig {
        starting_rank: 10,
        rank_floor: 1,
        ..EnvConfig::default()
    };
    assert!(MatmulEnv::new(config).is_err());

    let identity = SeedKind::Identity.build(MATRIX_DIM);
    assert!(MatmulEnv::verified(EnvConfig::for_candidate(1), identity).is_err());
}
