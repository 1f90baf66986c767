//! Metadata inheritance expressions
//!
//! `inherit_metadata` attaches one of two `outputEval` templates to an
//! output port. Both call `inheritMetadata` from [`EXPRESSION_LIB`], which
//! must therefore be present in the InlineJavascriptRequirement.

/// Marker used to recognise a generated `outputEval`.
const MARKER: &str = "inheritMetadata(";

/// Second argument of the generated call.
const INPUTS: &str = ", inputs.";

/// Prefix of the preprocessing assignment folded into a generated expression.
const PREPROCESS_PREFIX: &str = "self = ";

pub const EXPRESSION_LIB: &str = r#"var isNull = function(x) {
    return x === null || x === undefined;
};

var setMetadata = function(file, metadata) {
    if (!('metadata' in file)) {
        file['metadata'] = {};
    }
    for (var key in metadata) {
        file['metadata'][key] = metadata[key];
    }
    return file;
};

var inheritMetadata = function(o1, o2) {
    var commonMetadata = {};
    if (isNull(o1) || isNull(o2)) {
        return o1;
    }
    if (!Array.isArray(o2)) {
        o2 = [o2];
    }
    for (var i = 0; i < o2.length; i++) {
        var example = o2[i]['metadata'];
        for (var key in example) {
            if (i == 0) {
                commonMetadata[key] = example[key];
            } else if (!(commonMetadata[key] == example[key])) {
                delete commonMetadata[key];
            }
        }
        for (var key in commonMetadata) {
            if (!(key in example)) {
                delete commonMetadata[key];
            }
        }
    }
    if (!Array.isArray(o1)) {
        o1 = setMetadata(o1, commonMetadata);
    } else {
        for (var i = 0; i < o1.length; i++) {
            o1[i] = setMetadata(o1[i], commonMetadata);
        }
    }
    return o1;
};
"#;

/// `outputEval` copying metadata of `inputs.<input>` onto the produced file
/// (`single`) or onto every file of a produced array.
pub fn inherit_expression(single: bool, input: &str, preprocess: &str) -> String {
    let preprocess = if preprocess.is_empty() {
        String::new()
    } else {
        format!("\n    {preprocess}")
    };
    if single {
        format!(
            "${{{preprocess}\n    if (!isNull(self)){{\n        return inheritMetadata(self[0], inputs.{input})\n    }}\n    return self\n}}\n"
        )
    } else {
        format!(
            "${{{preprocess}\n    if (!isNull(self)) {{\n        return self.map(function(x) {{\n            return inheritMetadata(x, inputs.{input})\n        }})\n    }}\n    return self\n}}\n"
        )
    }
}

/// Was `expression` produced by [`inherit_expression`]?
///
/// Only an exact regeneration counts; hand-written bodies calling
/// `inheritMetadata` themselves do not.
pub fn is_generated(expression: &str) -> bool {
    let Some(input) = generated_input(expression) else {
        return false;
    };
    let preprocess = preprocess_of(expression).unwrap_or_default();
    [true, false]
        .into_iter()
        .any(|single| inherit_expression(single, input, preprocess) == expression)
}

/// Input id named in the `inheritMetadata(.., inputs.<id>)` call.
fn generated_input(expression: &str) -> Option<&str> {
    let call = &expression[expression.rfind(MARKER)? + MARKER.len()..];
    let rest = &call[call.find(INPUTS)? + INPUTS.len()..];
    rest.split(')').next()
}

/// Preprocessing line of a generated expression, if any.
pub fn preprocess_of(expression: &str) -> Option<&str> {
    expression
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(PREPROCESS_PREFIX))
}

/// `$(<expr>)` becomes `self = <expr>`; anything else is not inline.
pub fn fold_inline(expression: &str) -> Option<String> {
    let inner = expression.trim().strip_prefix("$(")?.strip_suffix(')')?;
    Some(format!("{PREPROCESS_PREFIX}{}", inner.trim()))
}
