use crate::core::allocator::TrackingCodeAllocator;
use crate::domain::model::{Package, PartyAddress, PostingCard, ShippingLabel};
use crate::domain::ports::Registrar;
use crate::utils::error::Result;

/// Builds one label per package, in package order, allocating a tracking code for each.
///
/// Allocation is strictly sequential: the code for package `n + 1` is only
/// requested after package `n` has its label. A failure stops the loop and
/// the codes already issued stay issued.
pub async fn assemble<R: Registrar + ?Sized>(
    posting_card: &PostingCard,
    sender: &PartyAddress,
    receiver: &PartyAddress,
    packages: &[Package],
    allocator: &TrackingCodeAllocator<'_, R>,
) -> Result<Vec<ShippingLabel>> {
    let mut labels = Vec::with_capacity(packages.len());

    for (index, package) in packages.iter().enumerate() {
        let service = package.service();
        let tracking_code = allocator.allocate_one(service).await?;
        tracing::debug!(
            package_index = index,
            service = %service,
            tracking_code = %tracking_code,
            "Shipping label assembled"
        );

        labels.push(ShippingLabel {
            posting_card: posting_card.clone(),
            sender: sender.clone(),
            receiver: receiver.clone(),
            service,
            tracking_code,
            package: package.clone(),
        });
    }

    Ok(labels)
}
