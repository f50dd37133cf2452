use signoz_mcp_tools::ToolResult;

pub fn print_tool_result(result: &ToolResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", result.joined_text());
    }
    Ok(())
}
