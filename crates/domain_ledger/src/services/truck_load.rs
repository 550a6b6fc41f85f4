//! Trucks, daily loads and weight-loss reporting

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info};

use core_kernel::{Clock, TruckId, TruckLoadId};

use super::{clean_text, finish_transaction, respond};
use crate::error::LedgerError;
use crate::ports::{UnitOfWork, UnitOfWorkProvider};
use crate::reports::{DailySummaryReport, WeightComparisonReport};
use crate::requests::{CreateTruckLoadRequest, CreateTruckRequest, UpdateTruckLoadRequest};
use crate::result::{ErrorCode, ServiceResult};
use crate::truck::{LoadStatus, Truck, TruckLoad};
use crate::validation::{normalize_digits, validate_load_figures, BusinessRequest};

const LOAD_VALIDATION_FAILED: &str = "Truck load validation failed";

/// Manages trucks and their loads and compares loaded with sold weight
pub struct TruckLoadService {
    provider: Arc<dyn UnitOfWorkProvider>,
    clock: Arc<dyn Clock>,
}

impl TruckLoadService {
    pub fn new(provider: Arc<dyn UnitOfWorkProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { provider, clock }
    }

    /// Registers a truck; numbers are unique
    pub async fn create_truck(&self, request: CreateTruckRequest) -> ServiceResult<Truck> {
        info!(truck_number = %request.truck_number.trim(), "Creating truck");
        let outcome = self.try_create_truck(&request).await;
        respond("create the truck", outcome, ErrorCode::CreationError, |truck| {
            format!("Truck {} created successfully", truck.truck_number)
        })
    }

    pub async fn get_truck(&self, id: TruckId) -> ServiceResult<Truck> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            existing_truck(&*uow, id).await
        }
        .await;
        respond("retrieve the truck", outcome, ErrorCode::RetrievalError, |_| {
            "Truck retrieved successfully".to_string()
        })
    }

    pub async fn active_trucks(&self) -> ServiceResult<Vec<Truck>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.trucks().list_active().await?)
        }
        .await;
        respond("retrieve trucks", outcome, ErrorCode::RetrievalError, |trucks| {
            format!("Retrieved {} trucks", trucks.len())
        })
    }

    /// Activates or retires a truck
    pub async fn set_truck_active(&self, id: TruckId, is_active: bool) -> ServiceResult<Truck> {
        info!(truck_id = %id, is_active, "Changing truck status");
        let outcome = self.try_set_truck_active(id, is_active).await;
        respond("update the truck", outcome, ErrorCode::UpdateError, |truck| {
            let state = if truck.is_active { "activated" } else { "deactivated" };
            format!("Truck {} {}", truck.truck_number, state)
        })
    }

    /// Records the weighed load of a truck for a day
    ///
    /// A truck has at most one load per date.
    pub async fn create_truck_load(&self, request: CreateTruckLoadRequest) -> ServiceResult<TruckLoad> {
        info!(
            truck_id = %request.truck_id,
            load_date = %request.load_date,
            total_weight = %request.total_weight,
            "Creating truck load"
        );
        let outcome = self.try_create_truck_load(&request).await;
        respond("create the truck load", outcome, ErrorCode::CreationError, |load| {
            format!("Truck load {} created successfully", load.id)
        })
    }

    /// Corrects the figures and status of a load; truck and date are fixed
    pub async fn update_truck_load(&self, id: TruckLoadId, request: UpdateTruckLoadRequest) -> ServiceResult<TruckLoad> {
        info!(load_id = %id, status = %request.status, "Updating truck load");
        let outcome = self.try_update_truck_load(id, &request).await;
        respond("update the truck load", outcome, ErrorCode::UpdateError, |load| {
            format!("Truck load {} updated successfully", load.id)
        })
    }

    /// Removes a load that no invoice was sold from
    pub async fn delete_truck_load(&self, id: TruckLoadId) -> ServiceResult<()> {
        info!(load_id = %id, "Deleting truck load");
        let outcome = self.try_delete_truck_load(id).await;
        respond("delete the truck load", outcome, ErrorCode::DeleteError, |_| {
            "Truck load deleted successfully".to_string()
        })
    }

    /// Marks the load's day as finished
    pub async fn complete_truck_load(&self, id: TruckLoadId) -> ServiceResult<TruckLoad> {
        info!(load_id = %id, "Completing truck load");
        let outcome = self.try_complete_truck_load(id).await;
        respond("complete the truck load", outcome, ErrorCode::CompletionError, |load| {
            format!("Truck load {} completed", load.id)
        })
    }

    pub async fn get_truck_load(&self, id: TruckLoadId) -> ServiceResult<TruckLoad> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            existing_load(&*uow, id).await
        }
        .await;
        respond("retrieve the truck load", outcome, ErrorCode::RetrievalError, |_| {
            "Truck load retrieved successfully".to_string()
        })
    }

    /// Loads of every truck on a date
    pub async fn truck_loads_on(&self, date: NaiveDate) -> ServiceResult<Vec<TruckLoad>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            Ok::<_, LedgerError>(uow.truck_loads().list_on(date).await?)
        }
        .await;
        respond("retrieve truck loads", outcome, ErrorCode::RetrievalError, |loads| {
            format!("Retrieved {} truck loads", loads.len())
        })
    }

    /// The load of one truck on a date
    pub async fn truck_load_for(&self, truck_id: TruckId, date: NaiveDate) -> ServiceResult<TruckLoad> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            load_for(&*uow, truck_id, date).await
        }
        .await;
        respond("retrieve the truck load", outcome, ErrorCode::RetrievalError, |_| {
            "Truck load retrieved successfully".to_string()
        })
    }

    /// Every load of one truck, newest first
    pub async fn truck_loads_for(&self, truck_id: TruckId) -> ServiceResult<Vec<TruckLoad>> {
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            existing_truck(&*uow, truck_id).await?;
            Ok::<_, LedgerError>(uow.truck_loads().list_for_truck(truck_id).await?)
        }
        .await;
        respond("retrieve truck loads", outcome, ErrorCode::RetrievalError, |loads| {
            format!("Retrieved {} truck loads", loads.len())
        })
    }

    /// Loaded weight against the net weight sold from one truck on one day
    pub async fn generate_weight_comparison_report(
        &self,
        truck_id: TruckId,
        date: NaiveDate,
    ) -> ServiceResult<WeightComparisonReport> {
        info!(truck_id = %truck_id, %date, "Generating weight comparison report");
        let outcome = async {
            let uow = self.provider.unit_of_work().await?;
            let truck = existing_truck(&*uow, truck_id).await?;
            let load = load_for(&*uow, truck_id, date).await?;
            compare(&*uow, &truck, &load).await
        }
        .await;
        respond("generate the weight comparison report", outcome, ErrorCode::ReportError, |report| {
            format!(
                "Weight comparison for truck {}: loss {}%",
                report.truck_number, report.loss_percentage
            )
        })
    }

    /// Weight comparison for every active truck loaded on the date, with totals
    pub async fn generate_daily_summary_report(&self, date: NaiveDate) -> ServiceResult<DailySummaryReport> {
        info!(%date, "Generating daily summary report");
        let outcome = self.try_daily_summary(date).await;
        respond("generate the daily summary report", outcome, ErrorCode::ReportError, |report| {
            format!("Daily summary generated for {} trucks", report.truck_count)
        })
    }

    async fn try_create_truck(&self, request: &CreateTruckRequest) -> Result<Truck, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let validation = BusinessRequest::Truck(request).validate(self.clock.today());
            if !validation.is_valid {
                return Err(LedgerError::validation("Truck validation failed", validation.errors));
            }

            let truck_number = request.truck_number.trim();
            if uow.trucks().find_by_number(truck_number).await?.is_some() {
                return Err(LedgerError::conflict(
                    ErrorCode::DuplicateTruck,
                    format!("Truck number {} already exists", truck_number),
                ));
            }

            let truck = Truck::new(
                truck_number,
                request.driver_name.trim(),
                clean_text(request.driver_phone.as_deref()).map(|p| normalize_digits(&p)),
                self.clock.now(),
            );
            let truck = uow.trucks().add(truck).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(truck)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_set_truck_active(&self, id: TruckId, is_active: bool) -> Result<Truck, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let mut truck = existing_truck(&*uow, id).await?;
            truck.is_active = is_active;
            truck.updated_at = Some(self.clock.now());
            uow.trucks().update(truck.clone()).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(truck)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_create_truck_load(&self, request: &CreateTruckLoadRequest) -> Result<TruckLoad, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let validation = BusinessRequest::TruckLoad(request).validate(self.clock.today());
            if !validation.is_valid {
                return Err(LedgerError::validation(LOAD_VALIDATION_FAILED, validation.errors));
            }

            match uow.trucks().get(request.truck_id).await? {
                Some(truck) if truck.is_active => {}
                _ => {
                    return Err(LedgerError::not_found(
                        ErrorCode::TruckNotFound,
                        "Truck not found or inactive",
                    ))
                }
            }

            let existing = uow
                .truck_loads()
                .find_for_truck_on(request.truck_id, request.load_date)
                .await?;
            if existing.is_some() {
                return Err(LedgerError::conflict(
                    ErrorCode::DuplicateLoad,
                    format!("Truck already has a load on {}", request.load_date),
                ));
            }

            let load = TruckLoad {
                id: TruckLoadId::UNASSIGNED,
                truck_id: request.truck_id,
                load_date: request.load_date,
                total_weight: request.total_weight,
                cages_count: request.cages_count,
                cages_weight: request.cages_weight,
                notes: clean_text(request.notes.as_deref()),
                status: LoadStatus::Loaded,
                is_completed: false,
                created_at: self.clock.now(),
                updated_at: None,
            };
            let load = uow.truck_loads().add(load).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(load)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_update_truck_load(
        &self,
        id: TruckLoadId,
        request: &UpdateTruckLoadRequest,
    ) -> Result<TruckLoad, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let mut load = existing_load(&*uow, id).await?;
            let validation = validate_load_figures(
                request.total_weight,
                request.cages_weight,
                request.cages_count,
                request.notes.as_deref(),
            );
            if !validation.is_valid {
                return Err(LedgerError::validation(LOAD_VALIDATION_FAILED, validation.errors));
            }

            let now = self.clock.now();
            load.total_weight = request.total_weight;
            load.cages_weight = request.cages_weight;
            load.cages_count = request.cages_count;
            load.notes = clean_text(request.notes.as_deref());
            load.set_status(request.status, now);
            load.updated_at = Some(now);
            uow.truck_loads().update(load.clone()).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(load)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_delete_truck_load(&self, id: TruckLoadId) -> Result<(), LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let load = existing_load(&*uow, id).await?;
            let invoices = uow.invoices().list_for_truck_on(load.truck_id, load.load_date).await?;
            if !invoices.is_empty() {
                return Err(LedgerError::conflict(
                    ErrorCode::HasRelatedInvoices,
                    format!("Cannot delete truck load with {} related invoices", invoices.len()),
                ));
            }
            uow.truck_loads().remove(id).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(())
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_complete_truck_load(&self, id: TruckLoadId) -> Result<TruckLoad, LedgerError> {
        let mut uow = self.provider.unit_of_work().await?;
        uow.begin_transaction().await?;
        let outcome = async {
            let mut load = existing_load(&*uow, id).await?;
            let now = self.clock.now();
            load.set_status(LoadStatus::Completed, now);
            load.updated_at = Some(now);
            uow.truck_loads().update(load.clone()).await?;
            uow.save_changes().await?;
            Ok::<_, LedgerError>(load)
        }
        .await;
        finish_transaction(uow.as_mut(), outcome).await
    }

    async fn try_daily_summary(&self, date: NaiveDate) -> Result<DailySummaryReport, LedgerError> {
        let uow = self.provider.unit_of_work().await?;
        let trucks = uow.trucks().list_with_loads_on(date).await?;

        let mut comparisons = Vec::with_capacity(trucks.len());
        for truck in &trucks {
            match uow.truck_loads().find_for_truck_on(truck.id, date).await? {
                Some(load) => comparisons.push(compare(&*uow, truck, &load).await?),
                None => debug!(truck_id = %truck.id, %date, "Truck has no load on date"),
            }
        }

        Ok(DailySummaryReport::summarize(date, comparisons))
    }
}

async fn existing_truck(uow: &dyn UnitOfWork, id: TruckId) -> Result<Truck, LedgerError> {
    uow.trucks()
        .get(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(ErrorCode::TruckNotFound, format!("Truck {} not found", id)))
}

async fn existing_load(uow: &dyn UnitOfWork, id: TruckLoadId) -> Result<TruckLoad, LedgerError> {
    uow.truck_loads()
        .get(id)
        .await?
        .ok_or_else(|| LedgerError::not_found(ErrorCode::LoadNotFound, format!("Truck load {} not found", id)))
}

async fn load_for(uow: &dyn UnitOfWork, truck_id: TruckId, date: NaiveDate) -> Result<TruckLoad, LedgerError> {
    uow.truck_loads()
        .find_for_truck_on(truck_id, date)
        .await?
        .ok_or_else(|| {
            LedgerError::not_found(
                ErrorCode::LoadNotFound,
                format!("No load found for truck {} on {}", truck_id, date),
            )
        })
}

async fn compare(uow: &dyn UnitOfWork, truck: &Truck, load: &TruckLoad) -> Result<WeightComparisonReport, LedgerError> {
    let invoices = uow.invoices().list_for_truck_on(truck.id, load.load_date).await?;

    let mut customer_names = HashMap::new();
    for invoice in &invoices {
        if customer_names.contains_key(&invoice.customer_id) {
            continue;
        }
        if let Some(customer) = uow.customers().get(invoice.customer_id).await? {
            customer_names.insert(customer.id, customer.customer_name);
        }
    }

    let report = WeightComparisonReport::compare(truck, load, &invoices, &customer_names);
    debug!(
        truck_number = %report.truck_number,
        loaded = %report.loaded_weight,
        sold = %report.sold_weight,
        loss_percentage = %report.loss_percentage,
        "Compared load with sales"
    );
    Ok(report)
}
