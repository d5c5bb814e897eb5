//! Prompt text for the SQL agent

use crate::toolkit::SqlTool;

/// System prompt shared by both strategies
pub fn sql_prefix(dialect: &str, top_k: usize) -> String {
    format!(
        "You are an agent designed to interact with a SQL database.
Given an input question, create a syntactically correct {dialect} query to run, then look at the results of the query and return the answer.
Unless the user specifies a specific number of examples they wish to obtain, always limit your query to at most {top_k} results.
You can order the results by a relevant column to return the most interesting examples in the database.
Never query for all the columns from a specific table, only ask for the relevant columns given the question.
You have access to tools for interacting with the database.
Only use the information returned by the tools to construct your final answer.
You MUST double check your query before executing it. If you get an error while executing a query, rewrite the query and try again.

DO NOT make any DML statements (INSERT, UPDATE, DELETE, DROP etc.) to the database.

If the question does not seem related to the database, just return \"I don't know\" as the answer."
    )
}

/// Nudge for the first step, appended to the tool-calling system prompt
pub const FIRST_STEP_HINT: &str =
    "Start by looking at the tables in the database to see what you can query. \
     Then query the schema of the most relevant tables.";

/// Tool list and output format for the ReAct strategy
pub fn react_instructions(tools: &[SqlTool]) -> String {
    let descriptions: Vec<String> = tools
        .iter()
        .map(|t| format!("{}: {}", t.name(), t.description()))
        .collect();
    let names: Vec<&str> = tools.iter().map(SqlTool::name).collect();

    format!(
        "You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question",
        tools = descriptions.join("\n"),
        names = names.join(", "),
    )
}

pub fn react_question(input: &str) -> String {
    format!(
        "Begin!\n\nQuestion: {}\nThought: I should look at the tables in the database to see what I can query. \
         Then I should query the schema of the most relevant tables.\n",
        input
    )
}

pub fn query_checker(query: &str, dialect: &str) -> String {
    format!(
        "{query}
Double check the {dialect} query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only.

SQL Query: "
    )
}
