mod boundary;
mod eval;
mod lifecycle;
mod snapshot;
mod step;

#[cfg(test)]
mod tests;
