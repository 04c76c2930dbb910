use crate::error::ChurnError;
use crate::features::schema::CategoricalField;

/// Encode one raw categorical value into the indicator columns its field
/// contributes to the schema.
///
/// Every indicator of the field is returned, in schema order, with exactly
/// one of them set to 1.0. The baseline level yields all zeros.
pub fn encode_categorical(
    field: CategoricalField,
    value: &str,
) -> Result<Vec<(&'static str, f32)>, ChurnError> {
    let spec = field.spec();
    if !spec.contains(value) {
        return Err(ChurnError::InvalidCategory {
            field: field.name().to_string(),
            value: value.to_string(),
        });
    }

    Ok(spec
        .indicators
        .iter()
        .map(|(level, column)| (*column, if *level == value { 1.0 } else { 0.0 }))
        .collect())
}
