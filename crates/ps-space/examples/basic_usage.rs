use indexmap::IndexMap;
use ps_space::*;
use ps_types::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Paramspace Basic Usage Example");

    // A flat space with an ordering constraint
    let a: Parameter = RangeParameter::new("a", ParameterType::Float, 0.5, 5.5)?.into();
    let b: Parameter = RangeParameter::new("b", ParameterType::Int, 2.0, 10.0)?.into();
    let c: Parameter = ChoiceParameter::new(
        "c",
        ParameterType::String,
        vec!["foo".into(), "bar".into(), "baz".into()],
    )?
    .into();
    let order = OrderConstraint::new(&a, &b)?;
    let space = SearchSpace::new(vec![a, b, c], vec![order.into()])?;
    println!("Created {space}");

    let point = parameterization! { "a" => 1.0, "b" => 5, "c" => "foo" };
    println!("{} is a member: {}", format_parameterization(&point), space.check_membership(&point));

    let mut outside = point.clone();
    outside.insert("a".to_string(), Some(5.3.into()));
    if let Err(e) = space.validate_membership(&outside) {
        println!("{} rejected: {e}", format_parameterization(&outside));
    }

    let arm = space.cast_arm(&Arm::named("0_0", parameterization! { "a" => 2, "b" => 4.0 }))?;
    println!("Cast arm: {arm}");
    println!("Out-of-design arm: {}", space.out_of_design_arm());

    // A hierarchical space: model-specific hyperparameters
    let model: Parameter = ChoiceParameter::new(
        "model",
        ParameterType::String,
        vec!["Linear".into(), "XGBoost".into()],
    )?
    .with_dependents(vec![
        (
            "Linear".into(),
            vec!["learning_rate".to_string(), "l2_reg_weight".to_string()],
        ),
        ("XGBoost".into(), vec!["num_boost_rounds".to_string()]),
    ])?
    .into();
    let hss = HierarchicalSearchSpace::new(
        vec![
            model,
            RangeParameter::new("learning_rate", ParameterType::Float, 0.001, 0.1)?.into(),
            RangeParameter::new("l2_reg_weight", ParameterType::Float, 0.00001, 0.001)?.into(),
            RangeParameter::new("num_boost_rounds", ParameterType::Int, 10.0, 20.0)?.into(),
        ],
        vec![],
    )?;
    println!("Hierarchy:\n{}", hss.hierarchical_structure_str(true));

    let obs = ObservationFeatures::new(parameterization! {
        "model" => "XGBoost",
        "learning_rate" => 0.01,
        "l2_reg_weight" => 0.0001,
        "num_boost_rounds" => 12,
    });
    let cast = hss.cast_observation_features(&obs)?;
    println!("Cast parameters: {}", format_parameterization(&cast.parameters));
    let flattened = hss.flatten_observation_features(&cast);
    println!(
        "Flattened parameters: {}",
        format_parameterization(&flattened.parameters)
    );

    // Digest of the flat view, as a model would see it
    let digest = hss.search_space().digest();
    println!("Digest of hierarchical space: {:?}", digest.map(|d| d.feature_names().to_vec()));

    let numeric = SearchSpace::new(
        vec![
            RangeParameter::new("x", ParameterType::Float, 0.0, 1.0)?.into(),
            ChoiceParameter::new("layers", ParameterType::Int, vec![1.into(), 2.into(), 4.into()])?
                .into(),
        ],
        vec![LinearConstraint::new(IndexMap::from([("x".to_string(), 1.0)]), 0.9)?.into()],
    )?;
    println!("Digest: {}", serde_json::to_string(&numeric.digest()?)?);

    println!("Example completed successfully!");
    Ok(())
}
