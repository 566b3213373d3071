use tracing::{info, instrument};

use shop_core::Address;
use shop_orders::{Member, MemberId};

use crate::error::{ServiceError, ServiceResult};
use crate::repository::MemberRepository;
use crate::store::UnitOfWork;

/// Member registration and lookup.
#[derive(Debug, Clone)]
pub struct MemberService<U> {
    uow: U,
}

impl<U> MemberService<U>
where
    U: UnitOfWork,
{
    pub fn new(uow: U) -> Self {
        Self { uow }
    }

    /// Register a member. Names are unique.
    #[instrument(skip(self, address), err)]
    pub fn join(&self, name: &str, address: Address) -> ServiceResult<MemberId> {
        let member = self.uow.transaction(|tx| -> ServiceResult<Member> {
            if tx.find_member_by_name(name)?.is_some() {
                return Err(ServiceError::Conflict(format!(
                    "member name already taken: {name}"
                )));
            }
            let member = Member::register(MemberId::generate(), name, address)?;
            tx.save_member(&member)?;
            Ok(member)
        })?;

        info!(member_id = %member.id_typed(), "member joined");
        Ok(member.id_typed())
    }

    pub fn find_members(&self) -> ServiceResult<Vec<Member>> {
        let mut tx = self.uow.begin();
        Ok(tx.find_members()?)
    }

    pub fn find_one(&self, id: MemberId) -> ServiceResult<Member> {
        let mut tx = self.uow.begin();
        tx.find_member(id)?
            .ok_or_else(|| ServiceError::not_found(format!("member {id}")))
    }

    pub fn find_by_name(&self, name: &str) -> ServiceResult<Option<Member>> {
        let mut tx = self.uow.begin();
        Ok(tx.find_member_by_name(name)?)
    }
}
