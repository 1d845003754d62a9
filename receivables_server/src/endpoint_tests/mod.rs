mod helpers;
mod mocks;
mod payments;
mod reports;
