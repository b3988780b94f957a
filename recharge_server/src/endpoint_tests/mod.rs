mod accounts;
mod helpers;
mod orders;
mod payments;
