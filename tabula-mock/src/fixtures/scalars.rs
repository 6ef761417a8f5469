use tabula_types::{Row, Value};

fn row(region: &str, carrier: &str, tech: &str, year: i64, fields: &[(&str, Value)]) -> Row {
    let mut r = Row::new();
    r.insert("region".into(), Value::from(region));
    r.insert("carrier".into(), Value::from(carrier));
    r.insert("tech".into(), Value::from(tech));
    r.insert("year".into(), Value::Int(year));
    for (k, v) in fields {
        r.insert((*k).to_string(), v.clone());
    }
    r
}

pub fn by_process(name: &str) -> Option<Vec<Row>> {
    match name {
        "wind_onshore" => Some(wind_onshore()),
        "pv_utility" => Some(vec![
            row("BB", "solar", "pv", 2030, &[
                ("installed_capacity", Value::Float(40.0)),
                ("overnight_cost", Value::Float(600.0)),
                ("fixed_cost", Value::Float(10.0)),
                ("lifetime", Value::Float(25.0)),
                ("wacc", Value::Float(0.05)),
            ]),
        ]),
        "gas_chp" => Some(vec![
            row("BB", "ch4", "chp", 2016, &[
                ("installed_capacity", Value::Float(80.0)),
                ("eta_el", Value::Float(0.35)),
                ("eta_th", Value::Float(0.5)),
                ("eta_cond", Value::Float(0.45)),
                ("carrier_cost", Value::Float(25.0)),
                ("lifetime", Value::Float(30.0)),
            ]),
            row("BB", "ch4", "chp", 2030, &[
                ("installed_capacity", Value::Float(60.0)),
                ("eta_el", Value::Float(0.38)),
                ("eta_th", Value::Float(0.5)),
                ("eta_cond", Value::Float(0.47)),
                ("carrier_cost", Value::Null),
                ("lifetime", Value::Float(30.0)),
            ]),
        ]),
        "battery" => Some(vec![
            row("BB", "electricity", "battery", 2030, &[
                ("installed_capacity", Value::Float(10.0)),
                ("storage_capacity", Value::Float(40.0)),
                ("efficiency", Value::Float(0.95)),
                ("loss_rate", Value::Float(0.001)),
                ("output_parameters", Value::Map(
                    [("max".to_string(), Value::Float(1.0))].into_iter().collect(),
                )),
            ]),
        ]),
        "demand" => Some(vec![
            row("BB", "electricity", "demand", 2016, &[("annual_demand", Value::Float(1200.0))]),
            row("BB", "electricity", "demand", 2030, &[("annual_demand", Value::Float(1350.0))]),
        ]),
        "transmission" => Some(vec![
            row("BB", "electricity", "ac_line", 2030, &[
                ("installed_capacity", Value::Float(500.0)),
                ("loss", Value::Float(0.03)),
            ]),
        ]),
        "broken_gt" => Some(vec![
            row("BB", "ch4", "gas_turbine", 2030, &[("installed_capacity", Value::Float(10.0))]),
        ]),
        _ => None,
    }
}

/// BB decommissions from 100 to 50 by 2050; BE is reported for one year.
fn wind_onshore() -> Vec<Row> {
    let costs = |overnight: f64| {
        [
            ("overnight_cost", Value::Float(overnight)),
            ("fixed_cost", Value::Float(20.0)),
            ("lifetime", Value::Float(20.0)),
            ("wacc", Value::Float(0.05)),
        ]
    };
    let with = |capacity: f64, overnight: f64| {
        let mut fields = vec![("installed_capacity", Value::Float(capacity))];
        fields.extend(costs(overnight));
        fields
    };
    vec![
        row("BB", "wind", "onshore", 2016, &with(100.0, 1200.0)),
        row("BB", "wind", "onshore", 2030, &with(100.0, 1000.0)),
        row("BB", "wind", "onshore", 2050, &with(50.0, 900.0)),
        row("BE", "wind", "onshore", 2030, &with(30.0, 1000.0)),
    ]
}
