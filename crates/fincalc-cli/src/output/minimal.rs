use serde_json::Value;

/// Print just the key answer value from the output.
///
/// A `solved_for` marker in the envelope names the answer directly;
/// otherwise look for well-known result fields in order of priority,
/// then fall back to the first scalar field in the result object.
pub fn print_minimal(value: &Value) {
    let envelope = value.as_object();
    let result_obj = envelope.and_then(|m| m.get("result")).unwrap_or(value);

    if let (Some(Value::String(field)), Value::Object(map)) =
        (envelope.and_then(|m| m.get("solved_for")), result_obj)
    {
        if let Some(val) = map.get(field.as_str()) {
            println!("{}", format_minimal(val));
            return;
        }
    }

    // Priority list of key output fields
    let priority_keys = [
        "monthly_payment",
        "total_interest",
        "future_value",
        "remaining_value",
        "final_balance",
        "emi",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        // Schedules and series are too long for minimal output
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array() && !v.is_object()) {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
