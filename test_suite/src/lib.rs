#[cfg(test)]
mod nested;
