mod copyright;
mod script;
mod table;
