// Demo: fits a 2-5-3 network to a smooth synthetic target with the batch
// trainer, then fine-tunes it stochastically.
//
//   RUST_LOG=info cargo run -- [train-config.json]
use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use flatprop::{
    train_loop, ActivationFunction, BatchTrainer, LayerSpec, LoopOptions, NetworkSpec,
    StochasticTrainer, Train, TrainConfig, TrainingPair, TrainingSet,
};

fn main() -> flatprop::Result<()> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => TrainConfig::load_json(&path)?,
        None => TrainConfig::default(),
    };

    let spec = NetworkSpec::new("demo-2-5-3", vec![
        LayerSpec::new(2, ActivationFunction::Identity),
        LayerSpec::new(5, ActivationFunction::Sigmoid),
        LayerSpec::new(3, ActivationFunction::Identity),
    ]);
    let mut network = spec.build()?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    network.randomize(&mut rng);

    let pairs = (0..10)
        .map(|_| {
            let a: f64 = rng.gen();
            let b: f64 = rng.gen();
            TrainingPair::new(vec![a, b], vec![0.5 * (a + b), a * b, 0.5 * (a - b) + 0.5])
        })
        .collect();
    let training = TrainingSet::new(pairs);

    let batch_error = {
        let mut trainer = BatchTrainer::new(&mut network, &training, config.clone())?;
        let error = train_loop(&mut trainer, &LoopOptions::new(100).with_target_error(1e-4))?;
        info!(
            "batch training stopped after {} iterations, error {:.6} (smoothed {:.6})",
            trainer.iteration_number(),
            error,
            trainer.smoothed_error()
        );
        error
    };

    let mut trainer = StochasticTrainer::new(&mut network, &training, config)?;
    let error = train_loop(&mut trainer, &LoopOptions::new(200))?;
    info!("stochastic fine-tuning: error {:.6} after {} examples", error, trainer.iteration_number());

    println!("batch error {batch_error:.6}, stochastic error {error:.6}");
    for pair in training.iter().take(3) {
        println!("{:?} -> {:?} (ideal {:?})", pair.input, network.compute(&pair.input)?, pair.ideal);
    }
    Ok(())
}
