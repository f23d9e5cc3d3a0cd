mod compile;
mod lower;
