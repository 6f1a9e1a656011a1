use crate::metadata::FileFacts;
use chrono::Datelike;
use chrono::Timelike;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplatePart {
    Literal(String),
    Token(Token),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Date,
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Size,
    OrigName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("テンプレートが空です")]
    Empty,
    #[error("中括弧の対応が不正です")]
    UnbalancedBraces,
    #[error("未対応トークンです: {0}")]
    UnknownToken(String),
}

pub fn parse_template(input: &str) -> Result<Vec<TemplatePart>, TemplateError> {
    if input.is_empty() {
        return Err(TemplateError::Empty);
    }

    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if !literal.is_empty() {
                    parts.push(TemplatePart::Literal(std::mem::take(&mut literal)));
                }
                let mut token = String::new();
                let mut found_close = false;
                for next in chars.by_ref() {
                    if next == '}' {
                        found_close = true;
                        break;
                    }
                    if next == '{' {
                        return Err(TemplateError::UnbalancedBraces);
                    }
                    token.push(next);
                }
                if !found_close || token.is_empty() {
                    return Err(TemplateError::UnbalancedBraces);
                }
                parts.push(TemplatePart::Token(parse_token(&token)?));
            }
            '}' => return Err(TemplateError::UnbalancedBraces),
            _ => literal.push(ch),
        }
    }

    if !literal.is_empty() {
        parts.push(TemplatePart::Literal(literal));
    }

    if parts.is_empty() {
        return Err(TemplateError::Empty);
    }

    Ok(parts)
}

pub fn render_template(parts: &[TemplatePart], facts: &FileFacts) -> String {
    let mut output = String::new();
    for part in parts {
        match part {
            TemplatePart::Literal(s) => output.push_str(s),
            TemplatePart::Token(token) => {
                let value = match token {
                    Token::Date => format_date(facts),
                    Token::Year => format!("{:04}", facts.modified.year()),
                    Token::Month => format!("{:02}", facts.modified.month()),
                    Token::Day => format!("{:02}", facts.modified.day()),
                    Token::Hour => format!("{:02}", facts.modified.hour()),
                    Token::Minute => format!("{:02}", facts.modified.minute()),
                    Token::Second => format!("{:02}", facts.modified.second()),
                    Token::Size => facts.size.to_string(),
                    Token::OrigName => facts.original_stem.clone(),
                };
                output.push_str(&normalize_token_value(&value));
            }
        }
    }

    output
}

fn parse_token(token: &str) -> Result<Token, TemplateError> {
    match token {
        "date" => Ok(Token::Date),
        "year" => Ok(Token::Year),
        "month" => Ok(Token::Month),
        "day" => Ok(Token::Day),
        "hour" => Ok(Token::Hour),
        "minute" => Ok(Token::Minute),
        "second" => Ok(Token::Second),
        "size" => Ok(Token::Size),
        "orig_name" => Ok(Token::OrigName),
        other => Err(TemplateError::UnknownToken(other.to_string())),
    }
}

fn format_date(facts: &FileFacts) -> String {
    let d = facts.modified;
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        d.year(),
        d.month(),
        d.day(),
        d.hour(),
        d.minute(),
        d.second()
    )
}

fn normalize_token_value(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join("-")
}
