mod aggregate;
mod open;
mod tag_counts;
