//! Prompt text sent to the generator.

/// System turn that opens every session.
///
/// `db_context` describes the target schema; `guidelines` holds house rules
/// for writing assertions. Either may be empty.
#[must_use]
pub fn system_prompt(db_context: &str, guidelines: &str) -> String {
    format!(
        r#"You are a helpful assistant that writes SQL data quality test queries.

Every test is a single SELECT statement that returns one row per checked record and
projects a column named test_result whose value is exactly 'PASS' or 'FAIL'.

Use this database context for your answers:
---
{db_context}
---
If the user wants to deploy or save a test, tell them to type 'save test' to save it.

Also follow these guidelines:
---
{guidelines}
---
"#
    )
}

/// Final instruction of the auxiliary request that condenses a conversation
/// into one candidate assertion.
pub const SUMMARIZE_TO_SQL: &str = "Summarize the data quality test we agreed on in this \
conversation as exactly one SQL command. Reply with the SQL statement only, inside a ```sql \
code block, with no explanation. If no test has been agreed on yet, reply with NO_TEST.";
