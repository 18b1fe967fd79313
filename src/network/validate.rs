use crate::data::dataset::TrainingSet;
use crate::error::{Result, TrainError};
use crate::network::network::FlatNetwork;

/// Checks that every example of `training` fits the network's input and
/// output widths.
pub fn validate_network_for_training(network: &FlatNetwork, training: &TrainingSet) -> Result<()> {
    if training.is_empty() {
        return Err(TrainError::config("the training set is empty"));
    }

    for (index, pair) in training.iter().enumerate() {
        if pair.input.len() != network.input_count() {
            return Err(TrainError::config(format!(
                "example {index} has {} inputs but the network's input layer has {} neurons",
                pair.input.len(),
                network.input_count()
            )));
        }
        if pair.ideal.len() != network.output_count() {
            return Err(TrainError::config(format!(
                "example {index} has {} ideal values but the network's output layer has {} neurons",
                pair.ideal.len(),
                network.output_count()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::activation::ActivationFunction;
    use crate::data::dataset::TrainingPair;
    use crate::network::spec::{LayerSpec, NetworkSpec};

    #[test]
    fn reports_the_offending_example() {
        let net = NetworkSpec::new("1-1", vec![
            LayerSpec::new(1, ActivationFunction::Identity),
            LayerSpec::new(1, ActivationFunction::Identity),
        ])
        .build()
        .unwrap();

        let set = TrainingSet::new(vec![
            TrainingPair::new(vec![0.0], vec![1.0]),
            TrainingPair::new(vec![0.0, 1.0], vec![1.0]),
        ]);

        let err = validate_network_for_training(&net, &set).unwrap_err();
        assert!(err.to_string().contains("example 1"));
    }
}
