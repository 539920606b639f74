//! Concrete services of the supply-chain pipeline.

pub mod demand;
pub mod governance;
pub mod inventory;
pub mod logistics;
pub mod procurement;
pub mod settlement;
pub mod supervisor;
pub mod supplier;

pub use demand::DemandService;
pub use governance::GovernanceService;
pub use inventory::InventoryService;
pub use logistics::{LogisticsExecutor, LogisticsInput};
pub use procurement::{ProcurementExecutor, ProcurementInput};
pub use settlement::{SettlementExecutor, SettlementInput};
pub use supervisor::OperationsSupervisor;
pub use supplier::SupplierIngestion;
