mod literal;
mod shape;
